use std::{collections::HashMap, sync::Arc};

use tokio::runtime::{Builder, Runtime};

use crate::{Config, Engine, Result};

pub struct EngineBuilder {
    async_worker_thread_number: u16,
    trigger_queue_size: usize,
    env: HashMap<String, String>,
    rt: Option<Arc<Runtime>>,
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self {
            async_worker_thread_number: 16,
            trigger_queue_size: 256,
            env: HashMap::new(),
            rt: None,
        }
    }
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn async_worker_thread_number(
        mut self,
        n: u16,
    ) -> Self {
        self.async_worker_thread_number = n;
        self
    }

    pub fn trigger_queue_size(
        mut self,
        n: usize,
    ) -> Self {
        self.trigger_queue_size = n;
        self
    }

    /// Add an environment variable exposed to handler code.
    pub fn env(
        mut self,
        key: &str,
        value: &str,
    ) -> Self {
        self.env.insert(key.to_string(), value.to_string());
        self
    }

    pub fn runtime(
        mut self,
        runtime: Arc<Runtime>,
    ) -> Self {
        self.rt = Some(runtime);
        self
    }

    pub fn build(&self) -> Result<Engine> {
        let runtime = if self.rt.is_some() {
            self.rt.as_ref().unwrap().clone()
        } else {
            Arc::new(Builder::new_multi_thread().worker_threads(self.async_worker_thread_number.into()).enable_all().build().unwrap())
        };

        let config = Config {
            async_worker_thread_number: self.async_worker_thread_number,
            trigger_queue_size: self.trigger_queue_size,
            env: self.env.clone(),
        };
        let engine = Engine::with_runtime(config, runtime);

        Ok(engine)
    }
}
