use std::sync::{Arc, RwLock};

use futures::future::BoxFuture;
use tokio::runtime::Runtime;

use crate::{
    ShareLock,
    common::{BroadcastQueue, Shutdown},
    events::{Event, HandlerLog, Notification},
};

macro_rules! dispatch_event {
    ($handles:expr, $(&$item:ident), +) => {
        let handlers = $handles.read().unwrap();
        for handle in handlers.iter() {
            (handle)($(&$item),+);
        }
    };
}

macro_rules! dispatch_event_async {
    ($handles:expr, $(&$item:ident), +) => {
        let handles = $handles.clone();

        tokio::spawn(async move {
            let handlers = handles.read().unwrap().clone();
            for handle in handlers.iter() {
                (handle)($(&$item),+).await;
            }
        });
    };
}

const NOTIFICATION_QUEUE_SIZE: usize = 2048;
const LOG_QUEUE_SIZE: usize = 4096;

pub type NotificationHandle = Arc<dyn Fn(&Event<Notification>) + Send + Sync>;
pub type HandlerLogHandle = Arc<dyn Fn(&Event<HandlerLog>) + Send + Sync>;
pub type NotificationHandleAsync = Arc<dyn Fn(&Event<Notification>) -> BoxFuture<'static, ()> + Send + Sync>;
pub type HandlerLogHandleAsync = Arc<dyn Fn(&Event<HandlerLog>) -> BoxFuture<'static, ()> + Send + Sync>;

#[derive(Debug, Clone)]
pub struct ChannelOptions {
    /// use the glob pattern to match the component id
    /// eg. chart*
    pub cid: String,

    /// use the glob pattern to match the linkage id
    /// eg. linkage1*
    pub lid: String,
}

impl Default for ChannelOptions {
    fn default() -> Self {
        Self {
            cid: "*".to_string(),
            lid: "*".to_string(),
        }
    }
}

impl ChannelOptions {
    pub fn new(
        cid: String,
        lid: String,
    ) -> Self {
        Self {
            cid,
            lid,
        }
    }

    pub fn with_cid(cid: String) -> Self {
        Self {
            cid,
            lid: "*".to_string(),
        }
    }

    pub fn with_lid(lid: String) -> Self {
        Self {
            cid: "*".to_string(),
            lid,
        }
    }
}

/// Injected notification channel.
///
/// Replaces the ambient window-global event bus of a browser host: actions
/// publish here and widgets subscribe through [`ChannelEvent`], so the engine
/// has no global state and is independently testable.
#[derive(Clone)]
pub struct Channel {
    notification_queue: Arc<BroadcastQueue<Event<Notification>>>,
    log_queue: Arc<BroadcastQueue<Event<HandlerLog>>>,

    notifications: ShareLock<Vec<NotificationHandle>>,
    logs: ShareLock<Vec<HandlerLogHandle>>,
    notifications_async: ShareLock<Vec<NotificationHandleAsync>>,
    logs_async: ShareLock<Vec<HandlerLogHandleAsync>>,

    runtime: Arc<Runtime>,
    shutdown: Arc<Shutdown>,
}

impl Channel {
    pub(crate) fn new(runtime: Arc<Runtime>) -> Self {
        Self {
            notification_queue: BroadcastQueue::new(NOTIFICATION_QUEUE_SIZE),
            log_queue: BroadcastQueue::new(LOG_QUEUE_SIZE),
            notifications: Arc::new(RwLock::new(Vec::new())),
            logs: Arc::new(RwLock::new(Vec::new())),
            notifications_async: Arc::new(RwLock::new(Vec::new())),
            logs_async: Arc::new(RwLock::new(Vec::new())),
            runtime,
            shutdown: Arc::new(Shutdown::new()),
        }
    }

    pub(crate) fn notification_queue(&self) -> Arc<BroadcastQueue<Event<Notification>>> {
        self.notification_queue.clone()
    }

    pub(crate) fn log_queue(&self) -> Arc<BroadcastQueue<Event<HandlerLog>>> {
        self.log_queue.clone()
    }

    pub(crate) fn listen(&self) {
        let mut notification_queue = self.notification_queue.subscribe();
        let mut log_queue = self.log_queue.subscribe();
        let notifications = self.notifications.clone();
        let logs = self.logs.clone();
        let notifications_async = self.notifications_async.clone();
        let logs_async = self.logs_async.clone();

        let shutdown = self.shutdown.clone();
        self.runtime.spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown.wait() => break,
                    Ok(e) = notification_queue.recv() => {
                        let evt = e.clone();
                        dispatch_event!(notifications, &evt);
                        dispatch_event_async!(notifications_async, &e);
                    }
                    Ok(log) = log_queue.recv() => {
                        let l = log.clone();
                        dispatch_event!(logs, &l);
                        dispatch_event_async!(logs_async, &log);
                    }
                }
            }
        });
    }

    pub(crate) fn shutdown(&self) {
        self.shutdown.shutdown();
    }
}

/// Glob-filtered subscription handle over a [`Channel`].
#[derive(Clone)]
pub struct ChannelEvent {
    channel: Arc<Channel>,

    glob: (globset::GlobMatcher, globset::GlobMatcher),
}

impl ChannelEvent {
    pub fn channel(
        channel: Arc<Channel>,
        options: ChannelOptions,
    ) -> Self {
        Self {
            channel,
            glob: (
                globset::Glob::new(&options.cid).unwrap().compile_matcher(),
                globset::Glob::new(&options.lid).unwrap().compile_matcher(),
            ),
        }
    }

    /// Subscribe to refresh notifications only.
    pub fn on_refresh(
        &self,
        f: impl Fn(&Event<Notification>) + Send + Sync + 'static,
    ) {
        let glob = self.glob.clone();

        self.channel.notifications.write().unwrap().push(Arc::new(move |e| {
            if e.is_refresh() && is_match(&glob, e) {
                f(e);
            }
        }));
    }

    /// Subscribe to every notification matching the glob options.
    pub fn on_notification(
        &self,
        f: impl Fn(&Event<Notification>) + Send + Sync + 'static,
    ) {
        let glob = self.glob.clone();

        self.channel.notifications.write().unwrap().push(Arc::new(move |e| {
            if is_match(&glob, e) {
                f(e);
            }
        }));
    }

    /// Subscribe to handler diagnostic lines.
    pub fn on_log(
        &self,
        f: impl Fn(&Event<HandlerLog>) + Send + Sync + 'static,
    ) {
        let glob = self.glob.clone();

        self.channel.logs.write().unwrap().push(Arc::new(move |e| {
            if is_match_log(&glob, e) {
                f(e);
            }
        }));
    }

    pub fn on_notification_async<F>(
        &self,
        f: F,
    ) where
        F: Fn(&Event<Notification>) -> BoxFuture<'static, ()> + Send + Sync + 'static,
    {
        let glob = self.glob.clone();

        self.channel.notifications_async.write().unwrap().push(Arc::new(move |e| {
            if is_match(&glob, e) {
                f(e)
            } else {
                Box::pin(async {})
            }
        }));
    }

    pub fn on_log_async<F>(
        &self,
        f: F,
    ) where
        F: Fn(&Event<HandlerLog>) -> BoxFuture<'static, ()> + Send + Sync + 'static,
    {
        let glob = self.glob.clone();

        self.channel.logs_async.write().unwrap().push(Arc::new(move |e| {
            if is_match_log(&glob, e) {
                f(e)
            } else {
                Box::pin(async {})
            }
        }));
    }
}

fn is_match(
    glob: &(globset::GlobMatcher, globset::GlobMatcher),
    e: &Event<Notification>,
) -> bool {
    let (pat_cid, pat_lid) = glob;
    pat_cid.is_match(&e.component_id) && pat_lid.is_match(&e.linkage_id)
}

fn is_match_log(
    glob: &(globset::GlobMatcher, globset::GlobMatcher),
    e: &Event<HandlerLog>,
) -> bool {
    let (pat_cid, pat_lid) = glob;
    pat_cid.is_match(&e.component_id) && pat_lid.is_match(&e.linkage_id)
}
