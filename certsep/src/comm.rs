//! Identities naming channels and process roles in diagnostics.
//!
//! Neither enumeration carries behavior.  A [`Comm`] tags every
//! frame-level diagnostic with the logical purpose of the channel it
//! was seen on; a [`Comp`] names the process role a supervision
//! diagnostic refers to.  The protocol itself never depends on either.

use derive_more::Display;

/// Logical purpose of one channel end.
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum Comm {
    /// Signing request handed to the network process.
    #[display(fmt = "req")]
    Request,
    /// Account key thumbprint for challenge responses.
    #[display(fmt = "thumbprint")]
    Thumbprint,
    /// Issued certificate.
    #[display(fmt = "cert")]
    Certificate,
    /// Signed JSON payload.
    #[display(fmt = "payload")]
    Payload,
    /// Replay nonce.
    #[display(fmt = "nonce")]
    Nonce,
    /// Challenge token.
    #[display(fmt = "token")]
    Token,
    /// Challenge operation.
    #[display(fmt = "challenge-op")]
    ChallengeOp,
    /// Challenge acknowledgement.
    #[display(fmt = "challenge-ack")]
    ChallengeAck,
    /// Account signing operation.
    #[display(fmt = "account")]
    Account,
    /// Certificate signing request.
    #[display(fmt = "csr")]
    Csr,
    /// Issuer certificate.
    #[display(fmt = "issuer")]
    Issuer,
    /// Full certificate chain.
    #[display(fmt = "chain")]
    Chain,
}

/// Process role within the issuance pipeline.
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum Comp {
    /// Talks to the certificate authority; network access only.
    #[display(fmt = "netproc")]
    Net,
    /// Holds the domain private key.
    #[display(fmt = "keyproc")]
    Key,
    /// Validates and serializes issued certificates.
    #[display(fmt = "certproc")]
    Cert,
    /// Holds the account private key.
    #[display(fmt = "acctproc")]
    Account,
    /// Publishes challenge responses.
    #[display(fmt = "chngproc")]
    Challenge,
    /// Writes issued material to disk.
    #[display(fmt = "fileproc")]
    File,
    /// Resolves the certificate authority's addresses.
    #[display(fmt = "dnsproc")]
    Dns,
    /// Handles certificate revocation.
    #[display(fmt = "revokeproc")]
    Revoke,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnostic_names() {
        assert_eq!(Comm::ChallengeAck.to_string(), "challenge-ack");
        assert_eq!(Comm::Csr.to_string(), "csr");
        assert_eq!(Comp::Net.to_string(), "netproc");
        assert_eq!(Comp::Revoke.to_string(), "revokeproc");
    }
}
