//! A transformer is an adapter over an iterator of pulldown-cmark `Event`. It
//! intercepts the events it cares about and yields rewritten ones, leaving
//! everything else untouched. Post bodies are passed through a chain of them
//! before being pushed to HTML.
use pulldown_cmark::Event;

pub mod heading;

/// A transformer over events, that takes in an inner iterator and returns
/// another iterator of events, which returns transformed events.
pub trait Transformer<'a, I>: Iterator<Item = Event<'a>> + Sized
where
    I: Iterator<Item = Event<'a>>,
{
    /// Wrap an inner iterator with the transformer
    fn transform(inner: I) -> Self;
}

/// Wrap an event iterator with another transformer, allowing for chaining.
pub trait WithTransformer<'a>: Iterator<Item = Event<'a>> + Sized {
    fn with_transformer<T: Transformer<'a, Self>>(self) -> T {
        T::transform(self)
    }
}

impl<'a, I: Iterator<Item = Event<'a>>> WithTransformer<'a> for I {}
