use std::collections::{BTreeMap, HashSet};
use std::ptr;

use foldhash::fast::RandomState;

use crate::errors::StmError;
use crate::region::Region;

/// A speculative transaction over a [`Region`].
///
/// Reads are optimistic and validated against the stripe table; writes are
/// buffered and published only at commit, under the write-set stripe
/// locks. Either the whole transaction takes effect at its commit-time
/// clock bump, or none of it does.
///
/// A transaction never blocks: contention surfaces as
/// [`StmError::Conflict`], after which the transaction is dead and must be
/// discarded. Retry belongs to the caller (see [`Region::transact`]).
pub struct Transaction<'a> {
    region: &'a Region,
    /// Clock snapshot taken at begin; the read version.
    rv: u64,
    is_ro: bool,
    /// Shared word addresses this transaction's outcome depends on.
    /// Empty for read-only transactions, which validate at read time only.
    read_set: HashSet<usize, RandomState>,
    /// Buffered writes, word address to word bytes. Last write wins; the
    /// ordered map fixes the stripe locking order at commit.
    write_set: BTreeMap<usize, Box<[u8]>>,
}

impl<'a> Transaction<'a> {
    pub(crate) fn new(region: &'a Region, is_ro: bool) -> Self {
        Self {
            region,
            rv: region.clock().sample(),
            is_ro,
            read_set: HashSet::default(),
            write_set: BTreeMap::new(),
        }
    }

    /// Whether this transaction was begun read-only.
    #[inline]
    pub fn is_read_only(&self) -> bool {
        self.is_ro
    }

    /// Transactional read of `size` bytes from shared `src` into private
    /// `dst`.
    ///
    /// Words buffered by an earlier [`write`](Self::write) of this
    /// transaction are delivered from the buffer; everything else is
    /// copied from shared memory and validated against the begin-time
    /// snapshot.
    ///
    /// # Errors
    ///
    /// [`StmError::Conflict`] if any word was locked or overwritten by a
    /// concurrent committer. The transaction is aborted; discard it.
    ///
    /// # Safety
    ///
    /// `src` must point into this region (initial segment or a live
    /// allocation) and `dst` into writable private memory, both aligned to
    /// the region alignment, non-overlapping, and valid for `size` bytes.
    /// `size` must be a multiple of the alignment.
    pub unsafe fn read(
        &mut self,
        src: *const u8,
        size: usize,
        dst: *mut u8,
    ) -> Result<(), StmError> {
        let align = self.region.align();
        debug_assert_eq!(size % align, 0);
        let words = size / align;
        let locks = self.region.locks();

        if self.is_ro {
            // Speculative copy, then post-validate each word. A writer
            // that raced the copy either still holds the stripe lock or
            // has already pushed the version past rv; either way the
            // sample rejects it. No read set is kept.
            for i in 0..words {
                let word = src as usize + i * align;
                ptr::copy_nonoverlapping(word as *const u8, dst.add(i * align), align);
                if !locks.validate(word, self.rv) {
                    return Err(StmError::Conflict);
                }
            }
        } else {
            for i in 0..words {
                let word = src as usize + i * align;
                let out = dst.add(i * align);
                // Read-your-own-writes: buffered values win over shared
                // memory.
                match self.write_set.get(&word) {
                    Some(val) => ptr::copy_nonoverlapping(val.as_ptr(), out, align),
                    None => ptr::copy_nonoverlapping(word as *const u8, out, align),
                }
                if !locks.validate(word, self.rv) {
                    return Err(StmError::Conflict);
                }
                // Tracked even for buffered hits: a concurrent commit to
                // this word still invalidates our serialization point.
                self.read_set.insert(word);
            }
        }
        Ok(())
    }

    /// Transactional write of `size` bytes from private `src` to shared
    /// `dst`.
    ///
    /// Purely local until commit: the words are buffered in the write set
    /// and shared memory is untouched. Writing the same address again
    /// overwrites the buffered value.
    ///
    /// # Safety
    ///
    /// `src` must point into readable private memory and `dst` into this
    /// region, both aligned to the region alignment, non-overlapping, and
    /// valid for `size` bytes. `size` must be a multiple of the
    /// alignment. The transaction must not be read-only.
    pub unsafe fn write(
        &mut self,
        src: *const u8,
        size: usize,
        dst: *mut u8,
    ) -> Result<(), StmError> {
        debug_assert!(!self.is_ro, "write inside a read-only transaction");
        let align = self.region.align();
        debug_assert_eq!(size % align, 0);
        let words = size / align;

        for i in 0..words {
            let mut val = vec![0u8; align].into_boxed_slice();
            ptr::copy_nonoverlapping(src.add(i * align), val.as_mut_ptr(), align);
            self.write_set.insert(dst as usize + i * align, val);
        }
        Ok(())
    }

    /// Allocate a fresh zeroed segment of `size` bytes, aligned like the
    /// region.
    ///
    /// Segment bookkeeping is deliberately outside the transactional core:
    /// the segment is visible to other threads immediately and is not
    /// retracted if this transaction aborts. Callers that need
    /// transactional allocation must layer it on top.
    pub fn alloc(&self, size: usize) -> Result<*mut u8, StmError> {
        self.region.alloc_segment(size)
    }

    /// Free a segment previously returned by [`alloc`](Self::alloc).
    ///
    /// Eager and non-transactional, like `alloc`. The caller must ensure
    /// no concurrent transaction still reaches into the segment. The
    /// initial segment is not freeable; unknown addresses abort with
    /// [`StmError::Conflict`].
    pub fn free(&self, addr: *mut u8) -> Result<(), StmError> {
        self.region.free_segment(addr)
    }

    /// Attempt to commit, consuming the transaction.
    ///
    /// Read-only transactions (and writers that buffered nothing) succeed
    /// trivially. Writers run the five-phase protocol: lock the write-set
    /// stripes, bump the clock, validate the read set, publish the
    /// buffered words, release the stripes with the new version.
    ///
    /// # Errors
    ///
    /// [`StmError::Conflict`] if a stripe was contended or a read turned
    /// stale. Nothing was published and all locks are released.
    pub fn commit(self) -> Result<(), StmError> {
        // Read-only fast path: nothing to lock, publish, or stamp.
        if self.write_set.is_empty() {
            return Ok(());
        }

        let locks = self.region.locks();

        // 1. Acquire the write-set stripes in ascending index order.
        // Deduped first: two write addresses may alias one stripe, and a
        // second try_lock on a stripe we already hold would read as
        // contention.
        let mut owned: Vec<usize> = self
            .write_set
            .keys()
            .map(|&addr| locks.index_of(addr))
            .collect();
        owned.sort_unstable();
        owned.dedup();

        for (held, &index) in owned.iter().enumerate() {
            if !locks.at(index).try_lock() {
                for &acquired in &owned[..held] {
                    locks.at(acquired).unlock();
                }
                return Err(StmError::Conflict);
            }
        }

        // 2. The linearization point: the post-increment clock value
        // becomes this transaction's write version.
        let wv = self.region.clock().bump();

        // 3. Validate the read set: every read must still be at its
        // begin-time version, or some committer has overwritten it since
        // and our snapshot is stale. When rv + 1 == wv no other writer
        // committed since begin, so nothing can have changed and the
        // pass is skipped. A stripe we hold ourselves is not a conflict;
        // only its version is checked.
        if self.rv + 1 != wv {
            for &addr in &self.read_set {
                let index = locks.index_of(addr);
                let (locked, version) = locks.at(index).sample();
                let ours = owned.binary_search(&index).is_ok();
                if (locked && !ours) || version > self.rv {
                    for &acquired in &owned {
                        locks.at(acquired).unlock();
                    }
                    return Err(StmError::Conflict);
                }
            }
        }

        // 4. Publish the buffered words.
        for (&addr, val) in &self.write_set {
            // SAFETY: `addr` was a valid shared destination when buffered,
            // and the stripe lock keeps competing committers out until
            // step 5.
            unsafe { ptr::copy_nonoverlapping(val.as_ptr(), addr as *mut u8, val.len()) };
        }

        // 5. Release each stripe, publishing the new version in the same
        // store that clears the lock bit.
        for &index in &owned {
            locks.at(index).set_version_and_unlock(wv);
        }

        Ok(())
    }
}
