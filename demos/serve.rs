//! Runnable streaming server over a local media directory.
//!
//! ```text
//! MEDIA_DIRECTORY=./media cargo run --example serve
//! curl -H 'Range: bytes=0-99' http://localhost:3000/videos/clip.mp4/stream
//! ```

use media_range::{MediaConfig, router};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = MediaConfig::from_env();
    let store = match config.build_store() {
        Ok(store) => store,
        Err(e) => {
            eprintln!("configuration error: {e}");
            std::process::exit(1);
        }
    };

    tracing::info!(?config, "starting media streaming server");

    let app = router(store);
    let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
