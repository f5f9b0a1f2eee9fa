//! Call classification and the per-precompile call-kind policies.
//!
//! The interpreter hands every precompile invocation a [`CallContext`]. The
//! guard functions in this module decide, before any state is touched,
//! whether the active precompile may proceed under that context.

use crate::error::SepError;
use alloy_primitives::Address;
use std::fmt;

/// The EVM invocation mode of the frame entering a precompile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallKind {
    /// Top-level call from an externally owned account.
    Direct,
    /// `CALL` from a contract.
    Call,
    /// `CALLCODE`: callee code runs in the caller's storage, `msg.sender` is
    /// the caller.
    CallCode,
    /// `DELEGATECALL`: callee code runs in the caller's storage, `msg.sender`
    /// is forwarded from the caller's frame.
    Delegate,
    /// `STATICCALL`, or any frame nested under one.
    Static,
}

impl CallKind {
    /// Returns true if the callee executes in the storage of the calling
    /// contract.
    pub const fn is_delegated(self) -> bool {
        matches!(self, Self::Delegate | Self::CallCode)
    }

    /// Returns true if the frame forbids state modification.
    pub const fn is_static(self) -> bool {
        matches!(self, Self::Static)
    }

    /// Classifies a frame from the addresses visible at the precompile
    /// boundary.
    ///
    /// `target` is the account whose storage the frame runs in and
    /// `bytecode` is the account whose code runs. A plain frame entered
    /// under a static context is reported as [`CallKind::Static`].
    pub fn infer(caller: Address, target: Address, bytecode: Address, is_static: bool) -> Self {
        if target == bytecode {
            if is_static {
                Self::Static
            } else {
                Self::Call
            }
        } else if caller == target {
            Self::CallCode
        } else {
            Self::Delegate
        }
    }
}

impl fmt::Display for CallKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Direct => "direct",
            Self::Call => "CALL",
            Self::CallCode => "CALLCODE",
            Self::Delegate => "DELEGATECALL",
            Self::Static => "STATICCALL",
        };
        f.write_str(name)
    }
}

/// Execution context of a single precompile invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallContext {
    /// `msg.sender` as seen by the precompile.
    pub caller: Address,
    /// Account whose storage the frame executes in.
    ///
    /// For delegated calls this is the calling contract; for plain calls it
    /// is the precompile address itself.
    pub namespace: Address,
    /// How the frame was entered.
    pub kind: CallKind,
    /// Whether the frame, or any frame it is nested under, is static.
    ///
    /// A `DELEGATECALL` issued from inside a `STATICCALL` keeps its
    /// delegated [`CallKind`] but inherits the static restriction.
    pub is_static: bool,
}

impl CallContext {
    /// Creates a new context. Only [`CallKind::Static`] frames start out
    /// static.
    pub const fn new(caller: Address, namespace: Address, kind: CallKind) -> Self {
        Self {
            caller,
            namespace,
            kind,
            is_static: kind.is_static(),
        }
    }

    /// Marks the frame as running under a static context.
    pub const fn with_static(mut self, is_static: bool) -> Self {
        self.is_static = is_static || self.kind.is_static();
        self
    }
}

/// Access class of a precompile function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Pure read of ledger state or metadata.
    Read,
    /// Function that writes balances or allowances.
    Write,
}

/// SEP101 runs only as delegated code inside the calling contract, and
/// writes only outside a static context.
pub fn ensure_sep101(ctx: &CallContext, access: Access) -> Result<(), SepError> {
    let kind = ctx.kind;
    if !kind.is_delegated() {
        tracing::warn!(target: "sep101", %kind, "call kind rejected");
        return Err(SepError::unauthorized(kind));
    }
    if access == Access::Write && ctx.is_static {
        tracing::warn!(target: "sep101", %kind, "write rejected in static context");
        return Err(SepError::unauthorized(CallKind::Static));
    }
    Ok(())
}

/// SEP206 reads are open to every call kind; writes need a live, non-static
/// frame whose `msg.sender` is the account that owns the coins.
pub fn ensure_sep206(ctx: &CallContext, access: Access) -> Result<(), SepError> {
    let kind = ctx.kind;
    match (access, kind) {
        (Access::Read, _) => Ok(()),
        (Access::Write, CallKind::Direct | CallKind::Call) if !ctx.is_static => Ok(()),
        (Access::Write, _) => {
            let kind = if ctx.is_static { CallKind::Static } else { kind };
            tracing::warn!(target: "sep206", %kind, "call kind rejected for state change");
            Err(SepError::unauthorized(kind))
        }
    }
}
