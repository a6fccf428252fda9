#[tokio::main]
async fn main() -> std::io::Result<()> {
    cell_server::run_with_config().await
}
