use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use crate::{cli::data::DataArgs, prelude::*, server};

#[derive(Parser)]
pub struct ServeArgs {
    #[clap(long, default_value = "127.0.0.1:8050", env = "BIND_ADDRESS")]
    bind_address: String,

    /// Upper bound on a single request.
    #[clap(long, default_value = "10s", env = "REQUEST_TIMEOUT")]
    request_timeout: humantime::Duration,

    #[clap(flatten)]
    data: DataArgs,
}

impl ServeArgs {
    #[instrument(skip_all, fields(bind_address = %self.bind_address))]
    pub async fn run(self) -> Result {
        let dashboard = Arc::new(self.data.load_dashboard()?);
        let listener = TcpListener::bind(&self.bind_address)
            .await
            .with_context(|| format!("failed to bind to `{}`", self.bind_address))?;
        server::serve(listener, server::router(dashboard, self.request_timeout.into())).await
    }
}
