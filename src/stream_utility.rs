use futures::stream::{FusedStream, Stream};
use futures::task::AtomicWaker;
use futures::StreamExt;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll};

/// `Plug` wraps around a `Stream`, letting another task cut it off and take
/// the inner stream back through the `UnplugHandle`.
///
/// ## Interface
///
/// `Plug` implements `FusedStream`. `Ready(None)` means the inner stream
/// was either unplugged or terminated; call `Plug::stream_terminated()`
/// **after** polling `Ready(None)` to tell the two apart.
pub struct Plug<S> {
    inner: Arc<PlugInner<S>>,
}

/// `UnplugHandle` returned by `Plug::new()` retrieves the inner stream.
pub struct UnplugHandle<S> {
    inner: Arc<PlugInner<S>>,
}

struct PlugInner<S> {
    state: Mutex<PlugState<S>>,
    waker: AtomicWaker,
}

enum PlugState<S> {
    Plugged(S),
    Unplugged,
    Terminated,
}

impl<S> PlugInner<S> {
    fn state(&self) -> MutexGuard<'_, PlugState<S>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<S> UnplugHandle<S> {
    /// Cut off the `Plug` and retrieve the inner stream.
    ///
    /// Returns:
    /// - `None` if the inner stream has terminated
    /// - `Some(stream)` otherwise; the `Plug` yields `None` from then on
    pub fn unplug(self) -> Option<S> {
        let mut state = self.inner.state();
        let stream = match std::mem::replace(&mut *state, PlugState::Unplugged) {
            PlugState::Plugged(s) => Some(s),
            PlugState::Terminated => {
                *state = PlugState::Terminated;
                None
            }
            PlugState::Unplugged => None,
        };
        drop(state);
        self.inner.waker.wake();
        stream
    }
}

impl<S: Stream + Unpin> Plug<S> {
    pub fn new(inner: S) -> (Self, UnplugHandle<S>) {
        let inner = Arc::new(PlugInner {
            state: Mutex::new(PlugState::Plugged(inner)),
            waker: AtomicWaker::new(),
        });
        (
            Plug {
                inner: inner.clone(),
            },
            UnplugHandle { inner },
        )
    }
}

impl<S: Stream + Unpin> Stream for Plug<S> {
    type Item = S::Item;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        // register first, so an `unplug` racing with this poll still wakes us
        self.inner.waker.register(cx.waker());
        let mut state = self.inner.state();
        match &mut *state {
            PlugState::Plugged(stream) => match stream.poll_next_unpin(cx) {
                Poll::Ready(None) => {
                    *state = PlugState::Terminated;
                    Poll::Ready(None)
                }
                other => other,
            },
            PlugState::Unplugged | PlugState::Terminated => Poll::Ready(None),
        }
    }
}

impl<S: Stream + Unpin> FusedStream for Plug<S> {
    fn is_terminated(&self) -> bool {
        !matches!(&*self.inner.state(), PlugState::Plugged(_))
    }
}

impl<S> Plug<S> {
    /// `true` if and only if the inner stream itself ended, as opposed to
    /// being unplugged.
    pub fn stream_terminated(&self) -> bool {
        matches!(&*self.inner.state(), PlugState::Terminated)
    }
}
