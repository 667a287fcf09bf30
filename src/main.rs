#[tokio::main]
async fn main() {
    let code = sastbench::app::startup::startup().await;
    std::process::exit(code);
}
