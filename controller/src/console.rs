use tokio::{
    io::{self, AsyncBufReadExt, BufReader},
    sync::mpsc::{self, error::TryRecvError, UnboundedReceiver},
};
use tracing::{debug, info, warn};

use bottle_common::{InputDebouncer, InputFrame, UserCommand};

/// Button emulation on stdin: `+`/`up`, `-`/`down`, `m`/`ok`/`mode`, one per line.
pub struct ConsoleInput {
    rx: UnboundedReceiver<(UserCommand, u64)>,
    debouncer: InputDebouncer,
    closed: bool,
}

impl ConsoleInput {
    /// Starts the stdin reader task. Presses are stamped with `now_ms` on
    /// arrival and debounced when the control loop drains them.
    pub fn spawn(edit_debounce_ms: u64, toggle_debounce_ms: u64, now_ms: fn() -> u64) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            let mut lines = BufReader::new(io::stdin()).lines();
            loop {
                let line = match lines.next_line().await {
                    Ok(Some(line)) => line,
                    Ok(None) => break,
                    Err(err) => {
                        warn!("console input error: {err}");
                        break;
                    }
                };
                match UserCommand::parse(&line) {
                    Some(command) => {
                        if tx.send((command, now_ms())).is_err() {
                            break;
                        }
                    }
                    None if line.trim().is_empty() => {}
                    None => warn!("unknown command {:?} (use +, -, m)", line.trim()),
                }
            }
        });

        info!("console buttons: + (up), - (down), m (mode)");
        Self::from_receiver(rx, InputDebouncer::new(edit_debounce_ms, toggle_debounce_ms))
    }

    fn from_receiver(
        rx: UnboundedReceiver<(UserCommand, u64)>,
        debouncer: InputDebouncer,
    ) -> Self {
        Self {
            rx,
            debouncer,
            closed: false,
        }
    }

    /// Collects every press received since the previous call.
    pub fn drain(&mut self) -> InputFrame {
        let mut frame = InputFrame::default();
        if self.closed {
            return frame;
        }

        loop {
            match self.rx.try_recv() {
                Ok((command, at_ms)) => {
                    if !self.debouncer.press(&mut frame, command, at_ms) {
                        debug!("debounced {command:?}");
                    }
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    info!("console input closed");
                    self.closed = true;
                    break;
                }
            }
        }
        frame
    }
}
