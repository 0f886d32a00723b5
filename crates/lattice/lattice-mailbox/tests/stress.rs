//! Thread-based stress test for the slot-exchange protocol.
//!
//! One writer thread and one reader thread per remaining peer hammer a
//! single heap-allocated mailbox. Each reader runs the tight
//! has-message / lock / read / unlock loop the real driver runs, and checks
//! the exchange guarantees on every observation:
//!
//! - no torn reads: every value read was actually published;
//! - monotone observation: values never go backwards, because a lock always
//!   lands on the current slot or one the writer retired after it;
//! - one outstanding handle per reader at all times.

use lattice_mailbox::{Mailbox, PeerId, PEER_COUNT};
use std::sync::Arc;

const PUBLICATIONS: u64 = 100_000;

#[test]
fn concurrent_readers_observe_a_monotone_stream() {
    let mailbox = Arc::new(Mailbox::<u64>::new());

    let mut readers = Vec::new();
    for index in 1..PEER_COUNT {
        let mailbox = Arc::clone(&mailbox);
        readers.push(std::thread::spawn(move || {
            let me = PeerId::new(index).unwrap();
            let mut last = 0u64;
            let mut observed = 0u64;
            loop {
                if mailbox.is_empty() {
                    std::hint::spin_loop();
                    continue;
                }
                let handle = mailbox.lock(me).expect("reader holds no other lock");
                // SAFETY: locked above, unlocked below; the borrow does not
                // outlive the lock.
                let value = unsafe { *mailbox.message(handle) };
                mailbox.unlock(me, handle).expect("handle is held");

                assert!(
                    (1..=PUBLICATIONS).contains(&value),
                    "torn or invented value {value}"
                );
                assert!(
                    value >= last,
                    "observation went backwards: {value} after {last}"
                );
                last = value;
                observed += 1;
                if value == PUBLICATIONS {
                    break;
                }
            }
            observed
        }));
    }

    for value in 1..=PUBLICATIONS {
        // With every reader holding at most one lock, the sizing argument
        // guarantees a free slot on every publish.
        mailbox.publish(value).expect("free slot must exist");
    }

    for reader in readers {
        let observed = reader.join().expect("reader thread panicked");
        assert!(observed > 0, "reader never saw a message");
    }
}

#[test]
fn writer_never_starves_while_readers_follow_the_one_lock_rule() {
    let mailbox = Arc::new(Mailbox::<u64>::new());

    let reader_mailbox = Arc::clone(&mailbox);
    let reader = std::thread::spawn(move || {
        let me = PeerId::new(1).unwrap();
        let mut seen_final = false;
        while !seen_final {
            if reader_mailbox.is_empty() {
                std::hint::spin_loop();
                continue;
            }
            let handle = reader_mailbox.lock(me).unwrap();
            seen_final = unsafe { *reader_mailbox.message(handle) } == PUBLICATIONS;
            reader_mailbox.unlock(me, handle).unwrap();
        }
    });

    for value in 1..=PUBLICATIONS {
        assert_eq!(mailbox.publish(value), Ok(()));
    }

    reader.join().expect("reader thread panicked");
}
