// In-process Resolution Service for tests
//
// Replies are computed by a closure. While the service is held, every call
// records its request and then waits until the test releases it, so tests
// can edit the document between dispatch and settle.

use async_trait::async_trait;
use seemless::services::resolution::{ResolutionError, ResolutionRequest, ResolutionService};
use std::sync::Mutex;
use tokio::sync::Semaphore;

type Reply = Box<dyn Fn(&ResolutionRequest) -> Result<String, ResolutionError> + Send + Sync>;

pub struct ScriptedService {
    reply: Reply,
    requests: Mutex<Vec<ResolutionRequest>>,
    gate: Semaphore,
}

impl ScriptedService {
    /// Service answering immediately with `reply`
    pub fn new<F>(reply: F) -> Self
    where
        F: Fn(&ResolutionRequest) -> Result<String, ResolutionError> + Send + Sync + 'static,
    {
        Self {
            reply: Box::new(reply),
            requests: Mutex::new(Vec::new()),
            gate: Semaphore::new(Semaphore::MAX_PERMITS),
        }
    }

    /// Service whose calls block until [`ScriptedService::release`]
    pub fn held<F>(reply: F) -> Self
    where
        F: Fn(&ResolutionRequest) -> Result<String, ResolutionError> + Send + Sync + 'static,
    {
        Self {
            reply: Box::new(reply),
            requests: Mutex::new(Vec::new()),
            gate: Semaphore::new(0),
        }
    }

    /// Always answer with the same text
    pub fn answering(answer: &'static str) -> Self {
        Self::new(move |_| Ok(answer.to_string()))
    }

    /// Always fail
    pub fn failing() -> Self {
        Self::new(|_| {
            Err(ResolutionError::Status {
                code: 500,
                message: Some("model unavailable".to_string()),
            })
        })
    }

    /// Let `n` held calls complete
    pub fn release(&self, n: usize) {
        self.gate.add_permits(n);
    }

    /// Requests received so far, in arrival order
    pub fn requests(&self) -> Vec<ResolutionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ResolutionService for ScriptedService {
    async fn resolve(&self, request: ResolutionRequest) -> Result<String, ResolutionError> {
        self.requests.lock().unwrap().push(request.clone());
        match self.gate.acquire().await {
            Ok(permit) => permit.forget(),
            Err(_) => return Err(ResolutionError::Unavailable("gate closed".to_string())),
        }
        (self.reply)(&request)
    }
}
