//! Scripted provider for delivery scenarios
//!
//! Replies are consumed in order; once the script runs out every send gets
//! the fallback reply (by default, acceptance with a generated id).
#![allow(dead_code)] // Test utility module - not all methods used in every test

use std::{
    collections::VecDeque,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};

use ahash::AHashSet;
use async_trait::async_trait;
use herald_delivery::{
    DeliveryId, Provider, ProviderType, RegionCode, SendError, SendRequest,
};
use tokio::time::Instant;

/// How the mock answers one send
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Accept(String),
    Reject,
    Transport,
}

#[derive(Debug)]
pub struct MockProvider {
    provider_type: ProviderType,
    unsupported: AHashSet<RegionCode>,
    receipts: bool,
    script: Mutex<VecDeque<Reply>>,
    fallback: Option<Reply>,
    sends: AtomicUsize,
    sent_at: Mutex<Vec<Instant>>,
}

impl MockProvider {
    pub fn builder(provider_type: ProviderType) -> MockProviderBuilder {
        MockProviderBuilder {
            provider_type,
            unsupported: AHashSet::default(),
            receipts: true,
            script: VecDeque::new(),
            fallback: None,
        }
    }

    /// Number of times `send` was called
    pub fn sends(&self) -> usize {
        self.sends.load(Ordering::SeqCst)
    }

    /// When each send happened
    pub fn sent_at(&self) -> Vec<Instant> {
        self.sent_at.lock().unwrap().clone()
    }

    pub fn as_provider(self: &Arc<Self>) -> Arc<dyn Provider> {
        Arc::clone(self) as Arc<dyn Provider>
    }
}

#[async_trait]
impl Provider for MockProvider {
    fn provider_type(&self) -> ProviderType {
        self.provider_type
    }

    fn unsupported_regions(&self) -> &AHashSet<RegionCode> {
        &self.unsupported
    }

    fn supports_delivery_status(&self) -> bool {
        self.receipts
    }

    async fn send(&self, _request: &SendRequest) -> Result<DeliveryId, SendError> {
        let count = self.sends.fetch_add(1, Ordering::SeqCst) + 1;
        self.sent_at.lock().unwrap().push(Instant::now());

        let reply = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .or_else(|| self.fallback.clone())
            .unwrap_or_else(|| Reply::Accept(format!("{}-{count}", self.provider_type)));

        match reply {
            Reply::Accept(id) => Ok(DeliveryId::from(id)),
            Reply::Reject => Err(SendError::Rejected("invalid destination".to_string())),
            Reply::Transport => Err(SendError::Transport("connection reset".to_string())),
        }
    }
}

pub struct MockProviderBuilder {
    provider_type: ProviderType,
    unsupported: AHashSet<RegionCode>,
    receipts: bool,
    script: VecDeque<Reply>,
    fallback: Option<Reply>,
}

impl MockProviderBuilder {
    /// Accept the next send with `id`
    pub fn accept(mut self, id: &str) -> Self {
        self.script.push_back(Reply::Accept(id.to_string()));
        self
    }

    /// Fail the next `times` sends
    pub fn fail(mut self, times: usize) -> Self {
        self.script
            .extend(std::iter::repeat_n(Reply::Reject, times));
        self
    }

    /// Fail every send once the script is used up
    pub fn always_fail(mut self) -> Self {
        self.fallback = Some(Reply::Transport);
        self
    }

    pub fn without_receipts(mut self) -> Self {
        self.receipts = false;
        self
    }

    pub fn unsupported(mut self, regions: &[&str]) -> Self {
        self.unsupported
            .extend(regions.iter().copied().map(RegionCode::new));
        self
    }

    pub fn build(self) -> Arc<MockProvider> {
        Arc::new(MockProvider {
            provider_type: self.provider_type,
            unsupported: self.unsupported,
            receipts: self.receipts,
            script: Mutex::new(self.script),
            fallback: self.fallback,
            sends: AtomicUsize::new(0),
            sent_at: Mutex::new(Vec::new()),
        })
    }
}
