//! Rejection hygiene for placeholder outputs.
//!
//! A transferred property may reject while nothing awaits it — the
//! program might never read that output. A gRPC transport failure in
//! that position is pure noise: the surrounding RPC already failed and
//! reports the same error on its own future. The observer spawned here
//! consumes that side effect. Anything else is a real fault and is
//! surfaced loudly.
//!
//! The observer never changes what consumers see: every clone of the
//! output still receives the rejection when awaited.

use tracing::{debug, error};

use strata_resource::Output;

/// Watches an output and consumes gRPC-classified rejections.
///
/// gRPC rejections are logged at debug level and swallowed; any other
/// rejection is logged at error level — the closest a library comes to
/// re-raising where no unhandled-rejection signal exists. Observation
/// requires an executor; without one there is no background await to
/// keep quiet, and consumers still see the rejection directly.
pub fn suppress_unhandled_grpc_rejections(output: &Output) {
    let rejection = output.rejection();
    let Ok(handle) = tokio::runtime::Handle::try_current() else {
        return;
    };
    handle.spawn(async move {
        match rejection.await {
            Some(err) if err.is_grpc() => {
                debug!(error = %err, "consumed grpc rejection; the surrounding call reports it");
            }
            Some(err) => {
                error!(error = %err, "unobserved output rejection");
            }
            None => {}
        }
    });
}
