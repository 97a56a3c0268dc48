//  Copyright 2022, The Tari Project
//
//  Redistribution and use in source and binary forms, with or without modification, are permitted provided that the
//  following conditions are met:
//
//  1. Redistributions of source code must retain the above copyright notice, this list of conditions and the following
//  disclaimer.
//
//  2. Redistributions in binary form must reproduce the above copyright notice, this list of conditions and the
//  following disclaimer in the documentation and/or other materials provided with the distribution.
//
//  3. Neither the name of the copyright holder nor the names of its contributors may be used to endorse or promote
//  products derived from this software without specific prior written permission.
//
//  THIS SOFTWARE IS PROVIDED BY THE COPYRIGHT HOLDERS AND CONTRIBUTORS "AS IS" AND ANY EXPRESS OR IMPLIED WARRANTIES,
//  INCLUDING, BUT NOT LIMITED TO, THE IMPLIED WARRANTIES OF MERCHANTABILITY AND FITNESS FOR A PARTICULAR PURPOSE ARE
//  DISCLAIMED. IN NO EVENT SHALL THE COPYRIGHT HOLDER OR CONTRIBUTORS BE LIABLE FOR ANY DIRECT, INDIRECT, INCIDENTAL,
//  SPECIAL, EXEMPLARY, OR CONSEQUENTIAL DAMAGES (INCLUDING, BUT NOT LIMITED TO, PROCUREMENT OF SUBSTITUTE GOODS OR
//  SERVICES; LOSS OF USE, DATA, OR PROFITS; OR BUSINESS INTERRUPTION) HOWEVER CAUSED AND ON ANY THEORY OF LIABILITY,
//  WHETHER IN CONTRACT, STRICT LIABILITY, OR TORT (INCLUDING NEGLIGENCE OR OTHERWISE) ARISING IN ANY WAY OUT OF THE
//  USE OF THIS SOFTWARE, EVEN IF ADVISED OF THE POSSIBILITY OF SUCH DAMAGE.

/// Returns the guard of a lock result, recovering the guard if the lock was poisoned. `$lock` only names the lock in the
/// log message and is not evaluated.
macro_rules! recover_lock {
    ($lock:expr, $result:expr) => {
        match $result {
            Ok(guard) => guard,
            Err(poisoned) => {
                log::warn!(
                    target: "comms::overlay",
                    "Lock `{}` was poisoned by a panicking thread and has been recovered",
                    stringify!($lock)
                );
                poisoned.into_inner()
            },
        }
    };
}

macro_rules! acquire_lock {
    ($e:expr, $m:ident) => {
        recover_lock!($e, $e.$m())
    };
    ($e:expr) => {
        recover_lock!($e, $e.lock())
    };
}

macro_rules! acquire_read_lock {
    ($e:expr) => {
        acquire_lock!($e, read)
    };
}

macro_rules! acquire_write_lock {
    ($e:expr) => {
        acquire_lock!($e, write)
    };
}

/// Logs a warning if `$expr` is an `Err` and discards the error. Evaluates to the `Ok` value as an `Option`.
///
/// ```ignore
/// log_if_error!(target: LOG_TARGET, transport.send(msg, &conn).await, "Failed to send to {}", address);
/// ```
macro_rules! log_if_error {
    (target: $target:expr, $expr:expr, $($msg:tt)+) => {
        match $expr {
            Ok(v) => Some(v),
            Err(err) => {
                log::warn!(target: $target, "{}: {}", format_args!($($msg)+), err);
                None
            },
        }
    };
}
