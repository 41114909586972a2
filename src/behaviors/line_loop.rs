//! Line-loop composition.
//!
//! Wraps another behavior so its response logic runs once per inbound line,
//! modeling clients that pipeline several requests over one connection.

use crate::behavior::{Behavior, Options};
use crate::stream::Connection;
use std::sync::Arc;

/// Repeats an inner behavior for every line read from the peer, terminating
/// at end of stream.
pub struct ForEachLine {
    name: String,
    inner: Arc<dyn Behavior>,
}

impl ForEachLine {
    /// Wrap `inner`, registering under `<inner name>ForEachLine`.
    pub fn wrap(inner: Arc<dyn Behavior>) -> Self {
        ForEachLine {
            name: format!("{}ForEachLine", inner.name()),
            inner,
        }
    }
}

#[async_trait::async_trait]
impl Behavior for ForEachLine {
    fn name(&self) -> &str {
        &self.name
    }

    async fn handle(&self, conn: &mut Connection, options: &Options) -> std::io::Result<()> {
        while conn.read_line().await?.is_some() {
            self.inner.handle(conn, options).await?;
        }
        Ok(())
    }
}
