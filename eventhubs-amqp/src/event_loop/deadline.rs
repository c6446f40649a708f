//! A stream that yields once the next watchdog is due

use std::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};

use futures_util::Stream;
use pin_project_lite::pin_project;
use tokio::time::{Instant, Sleep};

pin_project! {
    /// A wrapper over an `Option<Sleep>` which will never tick ready if there is no deadline
    #[derive(Debug)]
    pub(crate) struct Deadline {
        #[pin]
        sleep: Option<Sleep>
    }
}

impl Deadline {
    /// A [`Deadline`] that never yields
    pub fn never() -> Self {
        Self { sleep: None }
    }

    /// Moves the deadline, or disarms it with `None`
    pub fn reset(self: Pin<&mut Self>, deadline: Option<Instant>) {
        let mut sleep = self.project().sleep;
        let deadline = match deadline {
            Some(deadline) => deadline,
            None => {
                sleep.set(None);
                return;
            }
        };

        if let Some(current) = sleep.as_mut().as_pin_mut() {
            if current.deadline() != deadline {
                current.reset(deadline);
            }
            return;
        }
        sleep.set(Some(tokio::time::sleep_until(deadline)));
    }
}

impl Stream for Deadline {
    type Item = Instant;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.project();
        match this.sleep.as_pin_mut() {
            Some(mut sleep) => {
                let deadline = sleep.deadline();
                sleep.as_mut().poll(cx).map(|_| Some(deadline))
            }
            None => Poll::Pending,
        }
    }
}
