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

use tokio::sync::oneshot;

use super::{error::PeerExchangeError, messages::PeerExchangeResponse};

/// Correlates an outbound `PeerExchangeRequest` with its response. Each handler accepts exactly one response with a
/// matching nonce. Once disposed, a handler must not be used again.
#[derive(Debug)]
pub struct PeerExchangeHandler {
    nonce: i32,
    reply_tx: Option<oneshot::Sender<PeerExchangeResponse>>,
    is_disposed: bool,
}

impl PeerExchangeHandler {
    pub fn new(nonce: i32) -> (Self, oneshot::Receiver<PeerExchangeResponse>) {
        let (reply_tx, reply_rx) = oneshot::channel();
        let handler = Self {
            nonce,
            reply_tx: Some(reply_tx),
            is_disposed: false,
        };
        (handler, reply_rx)
    }

    pub fn nonce(&self) -> i32 {
        self.nonce
    }

    pub fn is_disposed(&self) -> bool {
        self.is_disposed
    }

    /// Delivers the response to the waiting exchange
    pub fn complete(&mut self, response: PeerExchangeResponse) -> Result<(), PeerExchangeError> {
        if self.is_disposed {
            return Err(PeerExchangeError::HandlerDisposed);
        }
        if response.nonce != self.nonce {
            return Err(PeerExchangeError::NonceMismatch {
                expected: self.nonce,
                actual: response.nonce,
            });
        }
        let reply_tx = self.reply_tx.take().ok_or(PeerExchangeError::AlreadyCompleted)?;
        // The exchange may have timed out, in which case the response is dropped
        let _result = reply_tx.send(response);
        Ok(())
    }

    /// Releases the handler. The waiting exchange, if any, is woken and fails.
    pub fn dispose(&mut self) {
        self.is_disposed = true;
        self.reply_tx = None;
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[tokio::test]
    async fn it_delivers_a_matching_response() {
        let (mut handler, rx) = PeerExchangeHandler::new(42);
        handler.complete(PeerExchangeResponse::new(42, vec![])).unwrap();
        assert_eq!(rx.await.unwrap().nonce, 42);
        assert_eq!(
            handler.complete(PeerExchangeResponse::new(42, vec![])),
            Err(PeerExchangeError::AlreadyCompleted)
        );
    }

    #[test]
    fn it_rejects_a_mismatched_nonce() {
        let (mut handler, _rx) = PeerExchangeHandler::new(1);
        assert_eq!(
            handler.complete(PeerExchangeResponse::new(2, vec![])),
            Err(PeerExchangeError::NonceMismatch { expected: 1, actual: 2 })
        );
        // Still waiting for the right response
        assert!(handler.complete(PeerExchangeResponse::new(1, vec![])).is_ok());
    }

    #[tokio::test]
    async fn it_cannot_be_used_after_disposal() {
        let (mut handler, rx) = PeerExchangeHandler::new(1);
        handler.dispose();
        assert!(handler.is_disposed());
        assert!(rx.await.is_err());
        assert_eq!(
            handler.complete(PeerExchangeResponse::new(1, vec![])),
            Err(PeerExchangeError::HandlerDisposed)
        );
    }
}
