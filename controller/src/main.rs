mod actuator;
mod console;
mod host;
mod http_store;
mod w1;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    host::run().await
}
