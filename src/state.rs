use std::sync::Arc;

use sqlx::PgPool;

use crate::config::Config;
use crate::external::message_transport::MessageTransport;
use crate::external::price_provider::PriceProvider;
use crate::store::kv::KvStore;

/// Everything a job or admin route needs to touch. The tabular store is
/// reached directly via `pool` (see `store::tabular::*`, which take a
/// `&PgPool` the way the teacher's query modules do); the kv store,
/// price provider and transport are behind trait objects so tests can
/// substitute in-memory/recording fakes.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub price_provider: Arc<dyn PriceProvider>,
    pub transport: Arc<dyn MessageTransport>,
    pub kv: Arc<dyn KvStore>,
    pub config: Arc<Config>,
}
