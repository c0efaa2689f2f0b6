use crate::gui_bridge::model::VisualizationModel;
use anyhow::Context;
use chrono::NaiveDate;
use serde_json::json;
use std::net::SocketAddr;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard};
use tokio::runtime::Builder;
use tokio::signal;
use warp::http::StatusCode;
use warp::reply::{Json, WithStatus};
use warp::Filter;

pub const DEFAULT_PORT: u16 = 9000;

pub fn gui_bind_address(port: u16) -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], port))
}

type SharedModel = Arc<RwLock<VisualizationModel>>;

fn read(state: &SharedModel) -> RwLockReadGuard<'_, VisualizationModel> {
    state.read().unwrap_or_else(PoisonError::into_inner)
}

fn ok<T: serde::Serialize>(body: &T) -> WithStatus<Json> {
    warp::reply::with_status(warp::reply::json(body), StatusCode::OK)
}

fn error(status: StatusCode, message: String) -> WithStatus<Json> {
    warp::reply::with_status(warp::reply::json(&json!({ "error": message })), status)
}

fn plot_reply(plot_id: i64, state: SharedModel) -> WithStatus<Json> {
    let records = read(&state).plot_records(plot_id);
    if records.is_empty() {
        error(StatusCode::NOT_FOUND, format!("unknown plot {}", plot_id))
    } else {
        ok(&records)
    }
}

fn snapshot_reply(raw: String, state: SharedModel) -> WithStatus<Json> {
    match NaiveDate::parse_from_str(&raw, "%Y-%m-%d") {
        Ok(date) => ok(&read(&state).snapshot(date)),
        Err(_) => error(
            StatusCode::BAD_REQUEST,
            format!("expected a YYYY-MM-DD date, got {}", raw),
        ),
    }
}

/// Read-only JSON feed over the latest published run.
#[derive(Clone, Default)]
pub struct GuiBridge {
    state: SharedModel,
}

impl GuiBridge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn routes(
        &self,
    ) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
        let state = self.state.clone();
        let state_filter = warp::any().map(move || state.clone());

        let summary = warp::path!("summary")
            .and(warp::get())
            .and(state_filter.clone())
            .map(|state: SharedModel| ok(&read(&state).summary_view()));

        let plots = warp::path!("plots" / i64)
            .and(warp::get())
            .and(state_filter.clone())
            .map(plot_reply);

        let transitions = warp::path!("transitions")
            .and(warp::get())
            .and(state_filter.clone())
            .map(|state: SharedModel| ok(&read(&state).transitions));

        let snapshot = warp::path!("snapshot" / String)
            .and(warp::get())
            .and(state_filter)
            .map(snapshot_reply);

        summary.or(plots).or(transitions).or(snapshot)
    }

    pub fn publish(&self, model: VisualizationModel) {
        let mut guard = self.state.write().unwrap_or_else(PoisonError::into_inner);
        *guard = model;
        println!(
            "[GUI] plots: {}, rows: {}, transitions: {}",
            guard.summary.plots,
            guard.records.len(),
            guard.transitions.len()
        );
    }

    pub fn publish_status(&self, message: &str) {
        println!("[GUI] {}", message);
    }

    /// Serves the routes on `127.0.0.1:<port>` until Ctrl+C.
    pub fn serve(&self, port: u16) -> anyhow::Result<()> {
        let runtime = Builder::new_multi_thread()
            .enable_all()
            .build()
            .context("creating bridge runtime")?;
        let routes = self.routes();
        runtime.block_on(async move {
            let (addr, server) = warp::serve(routes)
                .try_bind_with_graceful_shutdown(gui_bind_address(port), async {
                    if let Err(err) = signal::ctrl_c().await {
                        log::warn!("waiting for Ctrl+C failed: {}", err);
                    }
                })
                .with_context(|| format!("binding bridge to port {}", port))?;
            self.publish_status(&format!("HTTP bridge on http://{} (Ctrl+C to stop)", addr));
            server.await;
            Ok::<(), anyhow::Error>(())
        })?;
        self.publish_status("HTTP bridge stopped.");
        Ok(())
    }

    #[cfg(test)]
    pub fn snapshot(&self) -> VisualizationModel {
        read(&self.state).clone()
    }
}
