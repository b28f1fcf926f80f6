//! Stock allocation engine.
//!
//! Partitions a shared number pool into fixed-size packets, one rotating
//! guard number at the head of each. Pure: the caller owns reading state
//! in and persisting the remainder back out.

use tracing::info;

use crate::model::{GUARD_SLOTS, GuardList, Packet};
use crate::number::Number;

mod error;
pub use error::{AllocationError, JobError};

/// Result of a successful allocation. The caller persists `remainder` and
/// `new_pointer` at its commit point; the engine itself mutates nothing.
#[derive(Debug, Clone)]
pub struct Allocation {
    /// Packets in request order, each exactly `db_size` numbers.
    pub packets: Vec<Packet>,
    /// Unconsumed pool tail, original order.
    pub remainder: Vec<Number>,
    /// Guard pointer after advancing by the packet count, wrapped.
    pub new_pointer: usize,
}

/// Partition `pool` into `packet_count` packets of `db_size` numbers each.
///
/// Preconditions are checked in order and the first failure wins:
/// 1. `packet_count` must not exceed the guard list size;
/// 2. every guard slot the job would consume must hold a valid number;
/// 3. the pool must hold `(db_size - 1) * packet_count` numbers.
///
/// On success numbers are taken from the head of the pool in their existing
/// order and chunked contiguously: the first chunk becomes the first packet.
/// All-or-nothing; a failed call leaves nothing for the caller to undo.
pub fn allocate(
    packet_count: usize,
    pool: Vec<Number>,
    guards: &GuardList,
    pointer: usize,
    db_size: usize,
) -> Result<Allocation, AllocationError> {
    if packet_count > GUARD_SLOTS {
        return Err(AllocationError::TooManyPackets {
            requested: packet_count,
        });
    }

    // Every slot the job will consume must be valid before any pool math.
    let mut job_guards = Vec::with_capacity(packet_count);
    for offset in 0..packet_count {
        let slot = (pointer + offset) % GUARD_SLOTS;
        match guards.slot(slot) {
            Some(guard) => job_guards.push((slot, guard.clone())),
            None => return Err(AllocationError::GuardSlotMissing(slot)),
        }
    }

    debug_assert!(db_size >= 2, "a packet is one guard plus at least one number");
    let take_per_packet = db_size - 1;
    let required = take_per_packet * packet_count;
    if pool.len() < required {
        return Err(AllocationError::InsufficientStock {
            required,
            available: pool.len(),
        });
    }

    let mut pool = pool;
    let remainder = pool.split_off(required);

    let mut packets = Vec::with_capacity(packet_count);
    for ((slot, guard), chunk) in job_guards.into_iter().zip(pool.chunks_exact(take_per_packet)) {
        let mut numbers = Vec::with_capacity(db_size);
        numbers.push(guard);
        numbers.extend_from_slice(chunk);
        packets.push(Packet {
            guard_slot: slot,
            numbers,
        });
    }

    let new_pointer = (pointer + packet_count) % GUARD_SLOTS;

    info!(
        packets = packet_count,
        consumed = required,
        remaining = remainder.len(),
        pointer = new_pointer,
        "allocation complete"
    );

    Ok(Allocation {
        packets,
        remainder,
        new_pointer,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    // test utils

    fn pool(n: usize) -> Vec<Number> {
        (0..n)
            .map(|i| Number::parse(&format!("62812{i:07}")).unwrap())
            .collect()
    }

    fn full_guards() -> GuardList {
        let raw: Vec<String> = (0..GUARD_SLOTS).map(|i| format!("0899000000{i}")).collect();
        GuardList::from_raw(&raw)
    }

    #[test]
    fn single_packet_takes_head_of_pool() {
        let alloc = allocate(1, pool(10), &full_guards(), 0, 5).unwrap();

        assert_eq!(alloc.packets.len(), 1);
        let packet = &alloc.packets[0];
        assert_eq!(packet.numbers.len(), 5);
        assert_eq!(packet.guard_slot, 0);
        assert_eq!(packet.numbers[0].as_str(), "08990000000");
        assert_eq!(packet.numbers[1].as_str(), "628120000000");
        assert_eq!(packet.numbers[4].as_str(), "628120000003");

        // Remainder is the untouched tail, in order.
        assert_eq!(alloc.remainder.len(), 6);
        assert_eq!(alloc.remainder[0].as_str(), "628120000004");
        assert_eq!(alloc.remainder[5].as_str(), "628120000009");
    }

    #[test]
    fn packets_are_contiguous_chunks_in_request_order() {
        let alloc = allocate(3, pool(20), &full_guards(), 0, 5).unwrap();

        assert_eq!(alloc.packets.len(), 3);
        for (i, packet) in alloc.packets.iter().enumerate() {
            assert_eq!(packet.numbers.len(), 5);
            assert_eq!(packet.guard_slot, i);
            // Chunk i starts right where chunk i-1 ended.
            assert_eq!(
                packet.numbers[1].as_str(),
                format!("62812{:07}", i * 4)
            );
        }
        assert_eq!(alloc.remainder.len(), 8);
    }

    #[test]
    fn pointer_advances_by_packet_count_and_wraps() {
        let alloc = allocate(5, pool(25), &full_guards(), 7, 5).unwrap();

        assert_eq!(alloc.new_pointer, 2); // (7 + 5) % 10

        let slots: Vec<usize> = alloc.packets.iter().map(|p| p.guard_slot).collect();
        assert_eq!(slots, vec![7, 8, 9, 0, 1]);
    }

    #[test]
    fn conservation_across_successive_jobs() {
        let start = pool(30);
        let guards = full_guards();

        let first = allocate(2, start.clone(), &guards, 0, 5).unwrap();
        let second = allocate(1, first.remainder.clone(), &guards, first.new_pointer, 5).unwrap();

        let consumed: usize = first
            .packets
            .iter()
            .chain(second.packets.iter())
            .map(|p| p.numbers.len() - 1) // guards are not pool numbers
            .sum();
        assert_eq!(consumed + second.remainder.len(), start.len());

        // No pool number appears twice across the two jobs.
        let mut seen = std::collections::HashSet::new();
        for packet in first.packets.iter().chain(second.packets.iter()) {
            for n in &packet.numbers[1..] {
                assert!(seen.insert(n.clone()), "{n} allocated twice");
            }
        }
    }

    #[test]
    fn too_many_packets_rejected() {
        let err = allocate(11, pool(100), &full_guards(), 0, 5).unwrap_err();
        assert_eq!(err, AllocationError::TooManyPackets { requested: 11 });
    }

    #[test]
    fn ten_packets_is_the_limit_not_beyond() {
        assert!(allocate(10, pool(40), &full_guards(), 3, 5).is_ok());
    }

    #[test]
    fn missing_guard_slot_fails_before_stock_check() {
        let guards = GuardList::from_raw(["08990000000", "", "08990000002"]);

        // Slot 1 is empty; pool is also too small, but the guard check wins.
        let err = allocate(2, pool(1), &guards, 0, 5).unwrap_err();
        assert_eq!(err, AllocationError::GuardSlotMissing(1));
    }

    #[test]
    fn guard_check_covers_wrapped_slots() {
        // Slots 0..9 valid except slot 1.
        let raw: Vec<String> = (0..GUARD_SLOTS)
            .map(|i| {
                if i == 1 {
                    String::new()
                } else {
                    format!("0899000000{i}")
                }
            })
            .collect();
        let guards = GuardList::from_raw(&raw);

        // Starting at 9, three packets need slots 9, 0, 1.
        let err = allocate(3, pool(50), &guards, 9, 5).unwrap_err();
        assert_eq!(err, AllocationError::GuardSlotMissing(1));
    }

    #[test]
    fn insufficient_stock_reports_required_and_available() {
        let err = allocate(2, pool(7), &full_guards(), 0, 5).unwrap_err();
        assert_eq!(
            err,
            AllocationError::InsufficientStock {
                required: 8,
                available: 7,
            }
        );
    }

    #[test]
    fn exact_stock_leaves_empty_remainder() {
        let alloc = allocate(2, pool(8), &full_guards(), 0, 5).unwrap();
        assert!(alloc.remainder.is_empty());
        assert_eq!(alloc.packets.len(), 2);
    }

    #[test]
    fn full_size_packets() {
        let alloc = allocate(3, pool(800), &full_guards(), 0, 250).unwrap();

        assert_eq!(alloc.packets.len(), 3);
        for packet in &alloc.packets {
            assert_eq!(packet.numbers.len(), 250);
        }
        assert_eq!(alloc.remainder.len(), 800 - 3 * 249);
    }
}
