//! Ring buffer invariants under arbitrary and concurrent access.

use blockmix_core::RingBuffer;
use proptest::prelude::*;
use std::thread;

#[derive(Debug, Clone)]
enum Op {
    Write(usize),
    Read(usize),
}

fn ops() -> impl Strategy<Value = Vec<Op>> {
    prop::collection::vec(
        prop_oneof![
            (1usize..600).prop_map(Op::Write),
            (1usize..600).prop_map(Op::Read),
        ],
        1..200,
    )
}

proptest! {
    #[test]
    fn cursor_gap_stays_within_capacity(ops in ops()) {
        let (mut tx, mut rx) = RingBuffer::new(512, 128).unwrap().split();
        let mut scratch_l = vec![0.0f32; 600];
        let mut scratch_r = vec![0.0f32; 600];
        let mut model_available = 0usize;

        for op in ops {
            match op {
                Op::Write(n) => {
                    let fits = tx.has_space(n);
                    prop_assert_eq!(fits, 512 - model_available >= n);
                    if fits {
                        prop_assert!(tx.write(&scratch_l[..n], &scratch_r[..n], 1));
                        model_available += n;
                    }
                }
                Op::Read(n) => {
                    let got = rx.read(&mut scratch_l[..n], &mut scratch_r[..n]).frames;
                    prop_assert_eq!(got, n.min(model_available));
                    model_available -= got;
                }
            }
            let (read, write) = tx.ring().cursors();
            prop_assert!(read <= write);
            prop_assert!(write - read <= 512);
            prop_assert_eq!((write - read) as usize, model_available);
        }
    }
}

#[test]
fn concurrent_transfer_preserves_sequence() {
    const TOTAL: usize = 200_000;
    let (mut tx, mut rx) = RingBuffer::new(1024, 128).unwrap().split();

    let producer = thread::spawn(move || {
        let mut next = 0usize;
        let mut left = [0.0f32; 128];
        let mut right = [0.0f32; 128];
        while next < TOTAL {
            let n = 128.min(TOTAL - next);
            if !tx.has_space(n) {
                thread::yield_now();
                continue;
            }
            for i in 0..n {
                left[i] = (next + i) as f32;
                right[i] = -((next + i) as f32);
            }
            assert!(tx.write(&left[..n], &right[..n], 0));
            next += n;
        }
    });

    let mut expected = 0usize;
    let mut left = [0.0f32; 97];
    let mut right = [0.0f32; 97];
    while expected < TOTAL {
        let got = rx.read(&mut left, &mut right).frames;
        for i in 0..got {
            assert_eq!(left[i], (expected + i) as f32);
            assert_eq!(right[i], -((expected + i) as f32));
        }
        expected += got;
        if got == 0 {
            thread::yield_now();
        }
    }

    producer.join().unwrap();
}
