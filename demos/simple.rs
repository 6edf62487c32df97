//! Simple example demonstrating the wordstm API

use wordstm::Region;

fn main() {
    // A 1 KiB region of 8-byte words, zeroed.
    let region = Region::new(1024, 8).expect("region allocation");
    let checking = region.start() as usize;
    let savings = checking + 8;

    // Seed the two accounts in one atomic step.
    region.transact(false, |tx| {
        let bytes = 900u64.to_ne_bytes();
        unsafe { tx.write(bytes.as_ptr(), 8, checking as *mut u8)? };
        let bytes = 100u64.to_ne_bytes();
        unsafe { tx.write(bytes.as_ptr(), 8, savings as *mut u8)? };
        Ok(())
    });

    // Move 250 across; the closure retries automatically on conflict.
    region.transact(false, |tx| {
        let mut buf = [0u8; 8];
        unsafe { tx.read(checking as *const u8, 8, buf.as_mut_ptr())? };
        let from = u64::from_ne_bytes(buf);
        unsafe { tx.read(savings as *const u8, 8, buf.as_mut_ptr())? };
        let to = u64::from_ne_bytes(buf);

        let bytes = (from - 250).to_ne_bytes();
        unsafe { tx.write(bytes.as_ptr(), 8, checking as *mut u8)? };
        let bytes = (to + 250).to_ne_bytes();
        unsafe { tx.write(bytes.as_ptr(), 8, savings as *mut u8)? };
        Ok(())
    });

    // A read-only transaction sees both cells from one snapshot.
    let (from, to) = region.transact(true, |tx| {
        let mut buf = [0u8; 8];
        unsafe { tx.read(checking as *const u8, 8, buf.as_mut_ptr())? };
        let from = u64::from_ne_bytes(buf);
        unsafe { tx.read(savings as *const u8, 8, buf.as_mut_ptr())? };
        Ok((from, u64::from_ne_bytes(buf)))
    });

    println!("checking: {}", from);
    println!("savings:  {}", to);
    assert_eq!(from + to, 1000);
}
