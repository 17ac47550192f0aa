#[tokio::main]
async fn main() {
    if let Err(e) = subscription_service::run().await {
        log::error!("サーバーの実行中にエラーが発生しました: {}", e.details());
        eprintln!("サーバーの実行中にエラーが発生しました: {e}");
        std::process::exit(1);
    }
}
