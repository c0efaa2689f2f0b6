use log::{debug, info, warn};

/// Thin wrapper over the `log` facade that tags messages with their plot.
#[derive(Debug, Clone, Default)]
pub struct LogManager {
    prefix: Option<String>,
}

impl LogManager {
    pub fn new() -> Self {
        Self { prefix: None }
    }

    pub fn for_plot(plot_id: i64) -> Self {
        Self {
            prefix: Some(format!("plot {}", plot_id)),
        }
    }

    pub fn record(&self, message: &str) {
        info!("{}", self.tag(message));
    }

    pub fn detail(&self, message: &str) {
        debug!("{}", self.tag(message));
    }

    pub fn warn(&self, message: &str) {
        warn!("{}", self.tag(message));
    }

    fn tag(&self, message: &str) -> String {
        match &self.prefix {
            Some(prefix) => format!("{}: {}", prefix, message),
            None => message.to_string(),
        }
    }
}
