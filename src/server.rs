use crate::routes;
use crate::shared::config::ServerConfig;
use crate::shared::database::Database;
use crate::shared::errors::AppResult;
use crate::shared::http::error_body;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::{TokioIo, TokioTimer};
use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::time::{Duration, Instant};
use tokio::net::{TcpListener, TcpStream};

/// サブスクリプションAPIのHTTPサーバー
pub struct HttpServer {
    listener: TcpListener,
    db: Database,
    config: ServerConfig,
}

impl HttpServer {
    /// 設定されたアドレスで待ち受けを開始する
    ///
    /// # 引数
    /// * `config` - サーバー設定
    /// * `db` - 共有データベースハンドル
    ///
    /// # 戻り値
    /// HTTPサーバー、またはバインド失敗時はエラー
    pub async fn bind(config: ServerConfig, db: Database) -> AppResult<Self> {
        let listener = TcpListener::bind(&config.address).await?;
        log::info!("HTTPサーバーを開始しました: http://{}", listener.local_addr()?);

        Ok(Self {
            listener,
            db,
            config,
        })
    }

    /// 実際に待ち受けているアドレスを取得する
    pub fn local_addr(&self) -> AppResult<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// シャットダウンシグナルを受け取るまで接続を受け付ける
    ///
    /// 接続ごとにタスクを生成する。シグナル受信後は新しい接続を受け付けない。
    ///
    /// # 引数
    /// * `shutdown` - 完了したら停止するFuture
    pub async fn serve<F>(self, shutdown: F) -> AppResult<()>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    log::info!("シャットダウンシグナルを受信したため、接続の受け付けを停止します");
                    break;
                }
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        log::debug!("接続を受け付けました: {peer}");
                        let db = self.db.clone();
                        let config = self.config.clone();
                        tokio::spawn(async move {
                            handle_connection(stream, db, config).await;
                        });
                    }
                    Err(e) => {
                        log::error!("接続受け入れエラー: {e}");
                    }
                }
            }
        }

        Ok(())
    }
}

/// TCP接続を処理する
async fn handle_connection(stream: TcpStream, db: Database, config: ServerConfig) {
    let io = TokioIo::new(stream);
    let request_timeout = config.request_timeout;

    let service = service_fn(move |req| handle_request(req, db.clone(), request_timeout));

    let mut builder = http1::Builder::new();
    builder
        .timer(TokioTimer::new())
        .header_read_timeout(config.idle_timeout);

    if let Err(err) = builder.serve_connection(io, service).await {
        log::debug!("HTTP接続処理エラー: {err}");
    }
}

/// HTTPリクエストを処理し、アクセスログを出力する
///
/// `request_timeout` を超えたリクエストには503を返す。タイムアウトはレスポンスを
/// 打ち切るだけで、[`Database::run`] に渡されたブロッキング処理は中断されない。
/// そのため作成・更新は503の応答後にコミットされる場合がある。
async fn handle_request(
    req: Request<Incoming>,
    db: Database,
    request_timeout: Duration,
) -> Result<Response<String>, Infallible> {
    let started = Instant::now();
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let response = match tokio::time::timeout(request_timeout, routes::route(req, &db)).await {
        Ok(response) => response,
        Err(_) => {
            log::error!("リクエストがタイムアウトしました: {method} {path}");
            error_body(StatusCode::SERVICE_UNAVAILABLE, "request timed out")
        }
    };

    log::info!(
        "{method} {path} -> {} ({}ms)",
        response.status().as_u16(),
        started.elapsed().as_millis()
    );

    Ok(response)
}
