#![allow(dead_code)]

use async_trait::async_trait;
use imaginai::{
    ImageGenerationRequest, ImageGenerationResult, ImageGenerator, ImaginError, Orchestrator,
    PromptImprovementRequest, PromptImprovementResult, PromptImprover, Result,
};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// What a stub does when called.
#[derive(Clone)]
pub enum Reply<T> {
    Ok(T),
    Err(String),
}

/// Improver that records every request and replays scripted replies. When the
/// script runs out, the last reply repeats.
pub struct StubImprover {
    pub calls: Mutex<Vec<String>>,
    replies: Mutex<VecDeque<Reply<String>>>,
    last: Mutex<Option<Reply<String>>>,
}

impl StubImprover {
    pub fn replying(replies: Vec<Reply<String>>) -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            replies: Mutex::new(replies.into()),
            last: Mutex::new(None),
        })
    }

    pub fn always(improved: &str) -> Arc<Self> {
        Self::replying(vec![Reply::Ok(improved.to_string())])
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PromptImprover for StubImprover {
    async fn improve_prompt(
        &self,
        request: PromptImprovementRequest,
    ) -> Result<PromptImprovementResult> {
        self.calls.lock().unwrap().push(request.prompt.clone());

        let next = self.replies.lock().unwrap().pop_front();
        let reply = match next {
            Some(reply) => {
                *self.last.lock().unwrap() = Some(reply.clone());
                reply
            }
            None => self
                .last
                .lock()
                .unwrap()
                .clone()
                .unwrap_or(Reply::Ok(String::new())),
        };

        match reply {
            Reply::Ok(improved) => Ok(PromptImprovementResult::improved(&request, improved)),
            Reply::Err(message) => Err(ImaginError::RequestError(message)),
        }
    }
}

pub struct StubGenerator {
    pub calls: Mutex<Vec<String>>,
    reply: Reply<Option<String>>,
    attach_prompt: bool,
}

impl StubGenerator {
    pub fn returning(url: Option<&str>) -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            reply: Reply::Ok(url.map(String::from)),
            attach_prompt: false,
        })
    }

    pub fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            reply: Reply::Err(message.to_string()),
            attach_prompt: false,
        })
    }

    /// Fails the way the real backends do, with the attempted prompt attached.
    pub fn failing_with_prompt(message: &str) -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            reply: Reply::Err(message.to_string()),
            attach_prompt: true,
        })
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ImageGenerator for StubGenerator {
    async fn generate_image(
        &self,
        request: ImageGenerationRequest,
    ) -> Result<ImageGenerationResult> {
        self.calls.lock().unwrap().push(request.prompt.clone());

        match &self.reply {
            Reply::Ok(Some(url)) => Ok(ImageGenerationResult::with_url(url.clone())),
            Reply::Ok(None) => Ok(ImageGenerationResult::empty()),
            Reply::Err(message) => {
                let err = ImaginError::ResponseError(message.clone());
                if self.attach_prompt {
                    Err(ImaginError::attempted(request.prompt, err))
                } else {
                    Err(err)
                }
            }
        }
    }
}

pub fn orchestrator(improver: &Arc<StubImprover>, generator: &Arc<StubGenerator>) -> Orchestrator {
    Orchestrator::new(improver.clone(), generator.clone())
}
