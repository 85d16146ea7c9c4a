use std::sync::Arc;

use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::js_protocol::runtime::{
    ConsoleApiCalledType, EventConsoleApiCalled, EventExceptionThrown,
};
use chromiumoxide::Page;
use futures::StreamExt;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

use crate::error::{CheckError, CheckResult};

/// Owns the Chromium process and the task draining its CDP event stream.
/// One session per run; scenarios open their own pages on it.
pub struct BrowserSession {
    browser: Browser,
    handler_task: JoinHandle<()>,
}

impl BrowserSession {
    pub async fn launch(headed: bool) -> CheckResult<Self> {
        let mut builder = BrowserConfig::builder();
        if headed {
            builder = builder.with_head();
        }
        let config = builder
            .build()
            .map_err(|e| CheckError::Browser(format!("failed to build browser config: {}", e)))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| CheckError::Browser(format!("failed to launch chromium: {}", e)))?;

        // The handler stream must be drained or the CDP connection stalls.
        let handler_task = tokio::task::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        tracing::info!("Browser launched (headed: {})", headed);
        Ok(Self {
            browser,
            handler_task,
        })
    }

    pub async fn new_page(&self) -> CheckResult<Page> {
        self.browser
            .new_page("about:blank")
            .await
            .map_err(|e| CheckError::Browser(format!("failed to create page: {}", e)))
    }

    /// Close the browser process. Dropping the handles would reap it too;
    /// closing explicitly avoids a zombie between run end and process exit.
    pub async fn close(mut self) {
        if let Err(e) = self.browser.close().await {
            tracing::warn!("Browser did not close cleanly: {}", e);
        }
        self.handler_task.abort();
    }
}

/// A console message or uncaught exception captured from a page.
#[derive(Debug, Clone)]
pub struct ConsoleMessage {
    pub level: ConsoleLevel,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleLevel {
    Log,
    Info,
    Warning,
    Error,
    Exception,
    Other,
}

impl std::fmt::Display for ConsoleLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ConsoleLevel::Log => "log",
            ConsoleLevel::Info => "info",
            ConsoleLevel::Warning => "warn",
            ConsoleLevel::Error => "error",
            ConsoleLevel::Exception => "exception",
            ConsoleLevel::Other => "other",
        };
        write!(f, "{}", name)
    }
}

/// Accumulates console output and uncaught exceptions from one page.
/// Attach before navigating so nothing emitted during load is missed.
pub struct ConsoleCollector {
    messages: Arc<RwLock<Vec<ConsoleMessage>>>,
    tasks: Vec<JoinHandle<()>>,
}

impl ConsoleCollector {
    pub async fn attach(page: &Page) -> CheckResult<Self> {
        let messages: Arc<RwLock<Vec<ConsoleMessage>>> = Arc::new(RwLock::new(Vec::new()));
        let mut tasks = Vec::with_capacity(2);

        let mut console_events = page.event_listener::<EventConsoleApiCalled>().await?;
        let sink = messages.clone();
        tasks.push(tokio::task::spawn(async move {
            while let Some(event) = console_events.next().await {
                let level = match event.r#type {
                    ConsoleApiCalledType::Error => ConsoleLevel::Error,
                    ConsoleApiCalledType::Warning => ConsoleLevel::Warning,
                    ConsoleApiCalledType::Info => ConsoleLevel::Info,
                    ConsoleApiCalledType::Log => ConsoleLevel::Log,
                    _ => ConsoleLevel::Other,
                };
                let text = event
                    .args
                    .iter()
                    .map(|arg| match (&arg.value, &arg.description) {
                        (Some(serde_json::Value::String(s)), _) => s.clone(),
                        (Some(value), _) => value.to_string(),
                        (None, Some(description)) => description.clone(),
                        (None, None) => String::new(),
                    })
                    .collect::<Vec<_>>()
                    .join(" ");
                sink.write().await.push(ConsoleMessage { level, text });
            }
        }));

        let mut exception_events = page.event_listener::<EventExceptionThrown>().await?;
        let sink = messages.clone();
        tasks.push(tokio::task::spawn(async move {
            while let Some(event) = exception_events.next().await {
                let details = &event.exception_details;
                let text = details
                    .exception
                    .as_ref()
                    .and_then(|obj| obj.description.clone())
                    .unwrap_or_else(|| details.text.clone());
                sink.write().await.push(ConsoleMessage {
                    level: ConsoleLevel::Exception,
                    text,
                });
            }
        }));

        Ok(Self { messages, tasks })
    }

    pub async fn all(&self) -> Vec<ConsoleMessage> {
        self.messages.read().await.clone()
    }

    /// Console errors plus uncaught exceptions.
    pub async fn errors(&self) -> Vec<ConsoleMessage> {
        self.messages
            .read()
            .await
            .iter()
            .filter(|m| matches!(m.level, ConsoleLevel::Error | ConsoleLevel::Exception))
            .cloned()
            .collect()
    }
}

impl Drop for ConsoleCollector {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}
