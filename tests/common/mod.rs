// Test doubles for the model service

#![allow(dead_code)]

use std::sync::Mutex;
use tranquility::{GenerateRequest, GenerateResponse, ModelService, ServiceError, Turn};

/// How the mock answers each call
pub enum Behavior {
    /// Reply with "OK:" followed by the text of the newest turn
    Echo,
    /// Reply with fixed text
    Fixed(String),
    /// Echo, except the call with this zero-based index fails with a quota error
    FailOnCall(usize),
}

/// Model service that records every request it receives
pub struct MockModelService {
    behavior: Behavior,
    requests: Mutex<Vec<GenerateRequest>>,
}

impl MockModelService {
    pub fn new(behavior: Behavior) -> Self {
        Self {
            behavior,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<GenerateRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

fn echo(request: &GenerateRequest) -> String {
    let input = request.contents.last().map(Turn::text).unwrap_or_default();
    format!("OK:{}", input)
}

#[async_trait::async_trait]
impl ModelService for MockModelService {
    async fn generate(&self, request: &GenerateRequest) -> Result<GenerateResponse, ServiceError> {
        let call_index = {
            let mut requests = self.requests.lock().unwrap();
            requests.push(request.clone());
            requests.len() - 1
        };

        let text = match &self.behavior {
            Behavior::Echo => echo(request),
            Behavior::Fixed(text) => text.clone(),
            Behavior::FailOnCall(index) if *index == call_index => {
                return Err(ServiceError::Quota("mock quota exhausted".to_string()));
            }
            Behavior::FailOnCall(_) => echo(request),
        };

        Ok(GenerateResponse {
            text,
            finish_reason: Some("STOP".to_string()),
        })
    }

    fn name(&self) -> &str {
        "mock"
    }
}
