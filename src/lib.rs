//! Word-granularity software transactional memory over a shared region.
//!
//! # Architecture
//!
//! The engine is a TL2-style (Transactional Locking II) design built from
//! a global version clock and a striped table of versioned write locks:
//!
//! - **Reads**: Optimistic. No locks are taken; every word read is
//!   checked against its lock stripe, and a stale or in-flight word
//!   aborts the transaction.
//! - **Writes**: Buffered locally. Shared memory is touched only during
//!   the commit phase, under the write-set stripe locks, and stamped with
//!   a fresh clock value.
//! - **Granularity**: The word, `align` bytes of an aligned region. Any
//!   address, in the initial segment or a dynamically allocated one, maps
//!   onto one of 2^16 stripes.
//!
//! Committed transactions are atomic at their clock bump; aborted ones
//! leave no trace. The engine never blocks and never retries: conflicts
//! surface as [`StmError::Conflict`], and retry policy belongs to the
//! caller (or to [`Region::transact`], which loops for you).
//!
//! # Example
//!
//! ```
//! use wordstm::Region;
//!
//! let region = Region::new(64, 8).unwrap();
//! let counter = region.start() as usize;
//!
//! let seen = region.transact(false, |tx| {
//!     let mut buf = [0u8; 8];
//!     unsafe { tx.read(counter as *const u8, 8, buf.as_mut_ptr())? };
//!     let next = u64::from_ne_bytes(buf) + 1;
//!     let bytes = next.to_ne_bytes();
//!     unsafe { tx.write(bytes.as_ptr(), 8, counter as *mut u8)? };
//!     Ok(next)
//! });
//! assert_eq!(seen, 1);
//! ```

mod clock;
mod errors;
mod lock;
mod region;
mod stripes;
mod transaction;

pub use errors::StmError;
pub use region::Region;
pub use transaction::Transaction;
