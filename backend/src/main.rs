#[tokio::main]
async fn main() {
    market::start_server().await;
}
