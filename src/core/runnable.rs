// Runnable interface definition - the composition seam of the framework
use std::pin::Pin;

use futures::stream::Stream;
use tokio_stream::wrappers::ReceiverStream;

// Every invocable component (chain, agent executor, model wrapper) sits
// behind this interface so they can be piped into each other.
pub trait Runnable<I: Send + 'static, O: Send + 'static>: Send + Sync {
    // Core async call method (main entry point)
    fn invoke(
        &self,
        input: I,
    ) -> Pin<Box<dyn std::future::Future<Output = Result<O, anyhow::Error>> + Send>>;

    // Async batch processing for multiple inputs
    fn batch(
        &self,
        inputs: Vec<I>,
    ) -> Pin<Box<dyn std::future::Future<Output = Vec<Result<O, anyhow::Error>>> + Send>> {
        let self_clone = self.clone_to_owned();
        Box::pin(async move {
            futures::future::join_all(inputs.into_iter().map(|input| {
                let runner = self_clone.clone_to_owned();
                async move { runner.invoke(input).await }
            }))
            .await
        })
    }

    // Stream interface: a single-item stream backed by a channel. Components
    // that produce incremental output can override this.
    fn stream(&self, input: I) -> Box<dyn Stream<Item = Result<O, anyhow::Error>> + Send> {
        let self_clone = self.clone_to_owned();
        let (tx, rx) = tokio::sync::mpsc::channel::<Result<O, anyhow::Error>>(1);

        tokio::spawn(async move {
            let result = self_clone.invoke(input).await;
            let _ = tx.send(result).await;
        });

        Box::new(ReceiverStream::new(rx))
    }

    // Trait-object cloning, needed by the default batch/stream implementations
    fn clone_to_owned(&self) -> Box<dyn Runnable<I, O> + Send + Sync>;
}

// Runnable extension trait
pub trait RunnableExt<I: Send + 'static, O: Send + 'static> {
    fn pipe<NextO: Send + 'static>(
        self: Box<Self>,
        next: impl Runnable<O, NextO> + Send + Sync + 'static,
    ) -> impl Runnable<I, NextO> + Send + Sync
    where
        Self: Sized + 'static + Send + Sync;
}

impl<T: Runnable<I, O> + ?Sized, I: Send + 'static, O: Send + 'static> RunnableExt<I, O> for T {
    fn pipe<NextO: Send + 'static>(
        self: Box<Self>,
        next: impl Runnable<O, NextO> + Send + Sync + 'static,
    ) -> impl Runnable<I, NextO> + Send + Sync
    where
        Self: Sized + 'static + Send + Sync,
    {
        pipe(*self, next)
    }
}

// Utility function: connect two Runnables into a pipeline
pub fn pipe<I: Send + 'static, O1: Send + 'static, O2: Send + 'static>(
    first: impl Runnable<I, O1> + Send + Sync + 'static,
    second: impl Runnable<O1, O2> + Send + Sync + 'static,
) -> Box<dyn Runnable<I, O2> + Send + Sync> {
    struct PipeImpl<I: Send + 'static, O1: Send + 'static, O2: Send + 'static> {
        first: Box<dyn Runnable<I, O1> + Send + Sync>,
        second: Box<dyn Runnable<O1, O2> + Send + Sync>,
    }

    impl<I: Send + 'static, O1: Send + 'static, O2: Send + 'static> Runnable<I, O2>
        for PipeImpl<I, O1, O2>
    {
        fn invoke(
            &self,
            input: I,
        ) -> Pin<Box<dyn std::future::Future<Output = Result<O2, anyhow::Error>> + Send>> {
            let first_clone = self.first.clone_to_owned();
            let second_clone = self.second.clone_to_owned();

            Box::pin(async move {
                let intermediate = first_clone.invoke(input).await?;
                second_clone.invoke(intermediate).await
            })
        }

        fn clone_to_owned(&self) -> Box<dyn Runnable<I, O2> + Send + Sync> {
            Box::new(PipeImpl {
                first: self.first.clone_to_owned(),
                second: self.second.clone_to_owned(),
            })
        }
    }

    Box::new(PipeImpl {
        first: Box::new(first),
        second: Box::new(second),
    })
}

// A named wrapper over a composed runnable chain
pub struct RunnableSequence<I, O> {
    inner: Box<dyn Runnable<I, O> + Send + Sync>,
}

impl<I: Send + 'static, O: Send + 'static> RunnableSequence<I, O> {
    pub fn new(runnable: impl Runnable<I, O> + Send + Sync + 'static) -> Self {
        Self {
            inner: Box::new(runnable),
        }
    }
}

impl<I: Send + 'static, O: Send + 'static> Runnable<I, O> for RunnableSequence<I, O> {
    fn invoke(
        &self,
        input: I,
    ) -> Pin<Box<dyn std::future::Future<Output = Result<O, anyhow::Error>> + Send>> {
        let inner = self.inner.clone_to_owned();
        inner.invoke(input)
    }

    fn clone_to_owned(&self) -> Box<dyn Runnable<I, O> + Send + Sync> {
        Box::new(RunnableSequence {
            inner: self.inner.clone_to_owned(),
        })
    }
}

impl<I: Send + 'static, O: Send + 'static> Runnable<I, O> for Box<dyn Runnable<I, O> + Send + Sync> {
    fn invoke(
        &self,
        input: I,
    ) -> Pin<Box<dyn std::future::Future<Output = Result<O, anyhow::Error>> + Send>> {
        let self_clone = self.clone_to_owned();
        Box::pin(async move { self_clone.invoke(input).await })
    }

    fn clone_to_owned(&self) -> Box<dyn Runnable<I, O> + Send + Sync> {
        (**self).clone_to_owned()
    }
}
