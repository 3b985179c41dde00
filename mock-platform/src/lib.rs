//! # Mock Platform
//!
//! **INTERNAL USE ONLY**: an in-process gRPC server standing in for the platform in the
//! integration tests of `vectara-core`. It is not intended for production use.
//!
//! Replies are queued per method path together with the message types of that method.
//! Every call is recorded with its metadata and decoded request, so tests can assert on
//! what actually went over the wire without opening a socket.
use std::any::Any;
use std::collections::{HashMap, VecDeque};
use std::convert::Infallible;
use std::marker::PhantomData;
use std::sync::{Arc, Mutex, PoisonError};
use std::task::{Context, Poll};
use tonic::body::Body;
use tonic::codegen::{BoxFuture, Service};
use tonic::metadata::MetadataMap;
use tonic::server::{Grpc, UnaryService};
use tonic::{Request, Response, Status};
use tonic_prost::ProstCodec;

type Responder =
    Box<dyn FnOnce(http::Request<Body>) -> BoxFuture<http::Response<Body>, Infallible> + Send>;

/// A call as the server saw it.
pub struct RecordedCall {
    pub path: String,
    pub metadata: MetadataMap,
    message: Box<dyn Any + Send>,
}

impl RecordedCall {
    /// The decoded request, if it has type `T`.
    pub fn message<T: 'static>(&self) -> Option<&T> {
        self.message.downcast_ref()
    }
}

#[derive(Default)]
struct Inner {
    replies: Mutex<HashMap<String, VecDeque<Responder>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

#[derive(Clone, Default)]
pub struct MockPlatform {
    inner: Arc<Inner>,
}

impl MockPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues `reply` for the next call to `path`, decoding its request as `Req`.
    pub fn reply<Req, Resp>(&self, path: &str, reply: Result<Resp, Status>) -> &Self
    where
        Req: prost::Message + Default + Send + 'static,
        Resp: prost::Message + Send + 'static,
    {
        let inner = self.inner.clone();
        let recorded_path = path.to_string();

        let responder: Responder = Box::new(move |request| {
            Box::pin(async move {
                let handler = Handler::<Req, Resp> {
                    inner,
                    path: recorded_path,
                    reply: Some(reply),
                    _request: PhantomData,
                };
                let mut grpc = Grpc::new(ProstCodec::<Resp, Req>::default());
                Ok(grpc.unary(handler, request).await)
            })
        });

        self.inner
            .replies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(path.to_string())
            .or_default()
            .push_back(responder);
        self
    }

    /// Drains the calls recorded so far, oldest first.
    pub fn take_calls(&self) -> Vec<RecordedCall> {
        std::mem::take(
            &mut *self
                .inner
                .calls
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        )
    }

    fn next_responder(&self, path: &str) -> Option<Responder> {
        self.inner
            .replies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get_mut(path)
            .and_then(VecDeque::pop_front)
    }
}

struct Handler<Req, Resp> {
    inner: Arc<Inner>,
    path: String,
    reply: Option<Result<Resp, Status>>,
    _request: PhantomData<fn(Req)>,
}

impl<Req, Resp> UnaryService<Req> for Handler<Req, Resp>
where
    Req: Send + 'static,
    Resp: Send + 'static,
{
    type Response = Resp;
    type Future = BoxFuture<Response<Resp>, Status>;

    fn call(&mut self, request: Request<Req>) -> Self::Future {
        let (metadata, _, message) = request.into_parts();
        self.inner
            .calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(RecordedCall {
                path: self.path.clone(),
                metadata,
                message: Box::new(message),
            });

        let reply = self
            .reply
            .take()
            .unwrap_or_else(|| Err(Status::internal("reply already consumed")));
        Box::pin(async move { reply.map(Response::new) })
    }
}

impl Service<http::Request<Body>> for MockPlatform {
    type Response = http::Response<Body>;
    type Error = Infallible;
    type Future = BoxFuture<Self::Response, Self::Error>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: http::Request<Body>) -> Self::Future {
        let path = request.uri().path().to_string();
        match self.next_responder(&path) {
            Some(responder) => responder(request),
            None => Box::pin(async move {
                Ok(Status::unimplemented(format!("no reply queued for '{path}'")).into_http())
            }),
        }
    }
}
