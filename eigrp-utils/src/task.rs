//
// Copyright (c) The Eigrp Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task;
use tokio::time::sleep;
use tracing::error;

/// A handle which can be used to manipulate the task created by the
/// [`Task::spawn`] function.
///
/// Dropping this handle cancels the task.
#[derive(Debug)]
pub struct Task<T> {
    join_handle: task::JoinHandle<T>,
}

/// A handle to a one-shot timer task created by [`TimeoutTask::new`].
///
/// The timer can be restarted at any time, including after it has already
/// fired. Dropping this handle cancels the timer synchronously: the
/// underlying task is aborted and the callback can no longer run.
#[derive(Debug)]
pub struct TimeoutTask {
    #[cfg(not(feature = "testing"))]
    inner: TimeoutTaskInner,
}

#[derive(Debug)]
struct TimeoutTaskInner {
    _task: Task<()>,
    control: UnboundedSender<TimerCommand>,
}

#[derive(Debug)]
enum TimerCommand {
    Restart(Option<Duration>),
}

// ===== impl Task =====

impl<T> Task<T> {
    /// Spawns a new asynchronous task, returning a handle for it.
    pub fn spawn<Fut>(future: Fut) -> Task<T>
    where
        Fut: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        Task {
            join_handle: task::spawn(future),
        }
    }
}

impl<T> Future for Task<T> {
    type Output = Result<T, task::JoinError>;

    fn poll(
        mut self: Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Self::Output> {
        Pin::new(&mut self.join_handle).poll(cx)
    }
}

impl<T> Drop for Task<T> {
    fn drop(&mut self) {
        self.join_handle.abort();
    }
}

// ===== impl TimeoutTask =====

impl TimeoutTask {
    /// Spawns a new timer task that will call the provided async closure
    /// once the given timeout expires.
    #[cfg(not(feature = "testing"))]
    pub fn new<F, Fut>(timeout: Duration, cb: F) -> TimeoutTask
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (control_tx, control_rx) = mpsc::unbounded_channel();
        let task = Task::spawn(timer_loop(timeout, control_rx, cb));

        TimeoutTask {
            inner: TimeoutTaskInner {
                _task: task,
                control: control_tx,
            },
        }
    }

    /// Restarts the timer, regardless of whether it has already fired.
    ///
    /// When a new timeout value isn't given, the previous value is reused.
    pub fn reset(&mut self, timeout: Option<Duration>) {
        #[cfg(not(feature = "testing"))]
        {
            let command = TimerCommand::Restart(timeout);
            if self.inner.control.send(command).is_err() {
                error!("failed to reset timeout");
            }
        }
    }
}

// ===== helper functions =====

#[cfg(not(feature = "testing"))]
async fn timer_loop<F, Fut>(
    mut timeout: Duration,
    mut control_rx: mpsc::UnboundedReceiver<TimerCommand>,
    mut cb: F,
) where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let sleep_fut = sleep(timeout);
    tokio::pin!(sleep_fut);

    loop {
        tokio::select! {
            _ = &mut sleep_fut => {
                (cb)().await;

                // Wait for a restart request (or cancellation).
                match control_rx.recv().await {
                    Some(TimerCommand::Restart(new_timeout)) => {
                        timeout = new_timeout.unwrap_or(timeout);
                        sleep_fut
                            .as_mut()
                            .reset(tokio::time::Instant::now() + timeout);
                    }
                    None => break,
                }
            }
            command = control_rx.recv() => {
                match command {
                    Some(TimerCommand::Restart(new_timeout)) => {
                        timeout = new_timeout.unwrap_or(timeout);
                        sleep_fut
                            .as_mut()
                            .reset(tokio::time::Instant::now() + timeout);
                    }
                    None => break,
                }
            }
        }
    }
}
