//! Priority bookkeeping for the videos of one course.
//!
//! Priorities within a course form a dense sequence starting at
//! [`BASE_PRIORITY`]: no gaps, no duplicates. All mutations are expressed
//! against an in-memory [`CourseOrder`] snapshot of the course's
//! `(video, priority)` pairs; the repository loads the snapshot under a row
//! lock, applies one operation, and persists the returned reassignments in
//! the same transaction.

use crate::error::app_error::AppError;
use crate::models::video::SwapDirection;
use uuid::Uuid;

/// Lowest priority slot in every course.
pub const BASE_PRIORITY: i32 = 1;

/// A single priority update to persist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reassignment {
    pub video_id: Uuid,
    pub priority: i32,
}

/// Outcome of placing a video into a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    /// The priority the video actually received after clamping.
    pub assigned: i32,
    /// The previous occupant of that slot, if one had to move.
    pub displaced: Option<Reassignment>,
}

/// Snapshot of one course's priority slots.
///
/// Backed by a plain vector: course playlists are small, and a cross-course
/// move can temporarily leave two videos on the same priority (see
/// [`CourseOrder::place`]), which rules out a map keyed by priority.
#[derive(Debug, Clone, Default)]
pub struct CourseOrder {
    slots: Vec<(Uuid, i32)>,
}

impl CourseOrder {
    pub fn new(rows: impl IntoIterator<Item = (Uuid, i32)>) -> Self {
        let mut slots: Vec<(Uuid, i32)> = rows.into_iter().collect();
        slots.sort_by_key(|&(_, priority)| priority);
        Self { slots }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Highest occupied priority, or `BASE_PRIORITY - 1` for an empty course
    /// so that "append" is always `max_priority() + 1`.
    pub fn max_priority(&self) -> i32 {
        self.slots.iter().map(|&(_, p)| p).max().unwrap_or(BASE_PRIORITY - 1)
    }

    pub fn priority_of(&self, video_id: Uuid) -> Option<i32> {
        self.slots.iter().find(|&&(id, _)| id == video_id).map(|&(_, p)| p)
    }

    pub fn occupant(&self, priority: i32) -> Option<Uuid> {
        self.slots.iter().find(|&&(_, p)| p == priority).map(|&(id, _)| id)
    }

    fn clamp(&self, desired: i32) -> i32 {
        desired.clamp(BASE_PRIORITY, self.max_priority() + 1)
    }

    fn set_priority(&mut self, video_id: Uuid, priority: i32) {
        if let Some(slot) = self.slots.iter_mut().find(|(id, _)| *id == video_id) {
            slot.1 = priority;
        }
    }

    /// Insert a brand-new video at `desired`.
    ///
    /// The desired slot is clamped to `[BASE_PRIORITY, max + 1]`. If the slot
    /// is taken, the current occupant is pushed to the end of the course
    /// (`max + 1`) before the new video claims it, which keeps the sequence
    /// dense.
    pub fn insert(&mut self, video_id: Uuid, desired: i32) -> Placement {
        let assigned = self.clamp(desired);
        let displaced = self.occupant(assigned).map(|occupant| {
            let reassignment = Reassignment {
                video_id: occupant,
                priority: self.max_priority() + 1,
            };
            self.set_priority(occupant, reassignment.priority);
            reassignment
        });
        self.slots.push((video_id, assigned));
        self.slots.sort_by_key(|&(_, priority)| priority);

        Placement { assigned, displaced }
    }

    /// Place an existing video at `desired`; `self` must hold the target
    /// course's videos WITHOUT the one being moved.
    ///
    /// The slot is clamped to `[BASE_PRIORITY, len + 1]`: within the mover's
    /// own course that bound is the course's last slot (a move past the end
    /// takes the final position by swap), while a cross-course move can
    /// append one past the target's end.
    ///
    /// If another video occupies the target slot, the two trade places: the
    /// occupant receives the moving video's old priority (a 2-element
    /// transposition, not a shift). On a cross-course move `old_priority`
    /// belongs to the source course, so the occupant can land on a priority
    /// already taken in this course, and the source course keeps the hole the
    /// mover left behind; neither side is compacted here.
    pub fn place(&mut self, video_id: Uuid, old_priority: i32, desired: i32) -> Placement {
        let assigned = desired.clamp(BASE_PRIORITY, self.slots.len() as i32 + BASE_PRIORITY);
        let displaced = self.occupant(assigned).map(|occupant| {
            let reassignment = Reassignment {
                video_id: occupant,
                priority: old_priority,
            };
            self.set_priority(occupant, reassignment.priority);
            reassignment
        });
        self.slots.push((video_id, assigned));
        self.slots.sort_by_key(|&(_, priority)| priority);

        Placement { assigned, displaced }
    }

    /// Remove a video and close the gap: every slot above it shifts down by
    /// one. Returns the reassignments to persist.
    pub fn remove(&mut self, video_id: Uuid) -> Vec<Reassignment> {
        let Some(removed) = self.priority_of(video_id) else {
            return Vec::new();
        };
        self.slots.retain(|&(id, _)| id != video_id);

        let mut shifted = Vec::new();
        for slot in &mut self.slots {
            if slot.1 > removed {
                slot.1 -= 1;
                shifted.push(Reassignment {
                    video_id: slot.0,
                    priority: slot.1,
                });
            }
        }
        shifted
    }

    /// Exchange a video with its immediate neighbour.
    ///
    /// Fails with [`AppError::NoSwapTarget`] when no video occupies the
    /// adjacent slot, which happens at the range boundaries.
    pub fn swap_adjacent(&mut self, video_id: Uuid, direction: SwapDirection) -> Result<(Reassignment, Reassignment), AppError> {
        let current = self
            .priority_of(video_id)
            .ok_or_else(|| AppError::NotFound("Video not found".to_string()))?;
        let target = match direction {
            SwapDirection::Up => current - 1,
            SwapDirection::Down => current + 1,
        };
        let neighbour = self.occupant(target).filter(|&id| id != video_id).ok_or(AppError::NoSwapTarget)?;

        self.set_priority(video_id, target);
        self.set_priority(neighbour, current);
        self.slots.sort_by_key(|&(_, priority)| priority);

        Ok((
            Reassignment {
                video_id,
                priority: target,
            },
            Reassignment {
                video_id: neighbour,
                priority: current,
            },
        ))
    }

    /// Priorities currently assigned, ascending.
    pub fn priorities(&self) -> Vec<i32> {
        self.slots.iter().map(|&(_, p)| p).collect()
    }

    /// True when the priorities are exactly `BASE..BASE + n`.
    pub fn is_contiguous(&self) -> bool {
        self.priorities().iter().enumerate().all(|(i, &p)| p == BASE_PRIORITY + i as i32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn ids(n: usize) -> Vec<Uuid> {
        (0..n).map(|_| Uuid::new_v4()).collect()
    }

    fn order_of(ids: &[Uuid]) -> CourseOrder {
        CourseOrder::new(ids.iter().enumerate().map(|(i, &id)| (id, BASE_PRIORITY + i as i32)))
    }

    #[test]
    fn insert_into_empty_course_lands_on_base() {
        let mut order = CourseOrder::default();
        let video = Uuid::new_v4();
        let placement = order.insert(video, 7);
        assert_eq!(placement.assigned, BASE_PRIORITY);
        assert!(placement.displaced.is_none());
        assert!(order.is_contiguous());
    }

    #[test]
    fn insert_clamps_negative_to_base() {
        let v = ids(2);
        let mut order = order_of(&v);
        let video = Uuid::new_v4();
        let placement = order.insert(video, -5);
        assert_eq!(placement.assigned, BASE_PRIORITY);
        // The old head moved out of the way, to the end.
        assert_eq!(placement.displaced.unwrap().video_id, v[0]);
        assert!(order.is_contiguous());
    }

    #[test]
    fn insert_beyond_end_clamps_to_append() {
        let v = ids(3);
        let mut order = order_of(&v);
        let video = Uuid::new_v4();
        let placement = order.insert(video, 99);
        assert_eq!(placement.assigned, 4);
        assert!(placement.displaced.is_none());
        assert!(order.is_contiguous());
    }

    #[test]
    fn insert_at_occupied_slot_pushes_occupant_to_end() {
        // A(1), B(2), C(3); insert D at 2 -> B relocates to 4, D takes 2.
        let v = ids(3);
        let mut order = order_of(&v);
        let d = Uuid::new_v4();
        let placement = order.insert(d, 2);

        assert_eq!(placement.assigned, 2);
        assert_eq!(
            placement.displaced,
            Some(Reassignment {
                video_id: v[1],
                priority: 4
            })
        );
        assert_eq!(order.priority_of(v[0]), Some(1));
        assert_eq!(order.priority_of(d), Some(2));
        assert_eq!(order.priority_of(v[2]), Some(3));
        assert_eq!(order.priority_of(v[1]), Some(4));
        assert!(order.is_contiguous());
    }

    #[test]
    fn delete_shifts_higher_slots_down() {
        // A(1), B(2), C(3); delete B -> C shifts to 2.
        let v = ids(3);
        let mut order = order_of(&v);
        let shifted = order.remove(v[1]);

        assert_eq!(
            shifted,
            vec![Reassignment {
                video_id: v[2],
                priority: 2
            }]
        );
        assert_eq!(order.priority_of(v[0]), Some(1));
        assert_eq!(order.priority_of(v[2]), Some(2));
        assert!(order.is_contiguous());
    }

    #[test]
    fn delete_unknown_video_is_a_no_op() {
        let v = ids(3);
        let mut order = order_of(&v);
        assert!(order.remove(Uuid::new_v4()).is_empty());
        assert_eq!(order.len(), 3);
    }

    #[test]
    fn delete_then_reinsert_at_end_restores_ordering() {
        let v = ids(4);
        let mut order = order_of(&v);
        order.remove(v[3]);
        let placement = order.insert(v[3], 4);

        assert_eq!(placement.assigned, 4);
        for (i, &id) in v.iter().enumerate() {
            assert_eq!(order.priority_of(id), Some(BASE_PRIORITY + i as i32));
        }
    }

    #[test]
    fn delete_then_reinsert_mid_slot_pushes_shifted_occupant_to_end() {
        // A,B,C,D; delete B, then re-add it at slot 2: C, which had shifted
        // into 2, yields the slot and moves to the end.
        let v = ids(4);
        let mut order = order_of(&v);
        order.remove(v[1]);
        let placement = order.insert(v[1], 2);

        assert_eq!(placement.assigned, 2);
        assert_eq!(order.priority_of(v[0]), Some(1));
        assert_eq!(order.priority_of(v[1]), Some(2));
        assert_eq!(order.priority_of(v[3]), Some(3));
        assert_eq!(order.priority_of(v[2]), Some(4));
        assert!(order.is_contiguous());
    }

    #[test]
    fn same_course_move_is_a_pairwise_swap() {
        // A(1), B(2), C(3); move C to 1 -> A takes C's old slot 3.
        let v = ids(3);
        let mut order = CourseOrder::new([(v[0], 1), (v[1], 2)]);
        let placement = order.place(v[2], 3, 1);

        assert_eq!(placement.assigned, 1);
        assert_eq!(
            placement.displaced,
            Some(Reassignment {
                video_id: v[0],
                priority: 3
            })
        );
        assert!(order.is_contiguous());
    }

    #[test]
    fn move_to_own_slot_changes_nothing_else() {
        let v = ids(3);
        // Moving B to its own priority: the model holds the others only.
        let mut order = CourseOrder::new([(v[0], 1), (v[2], 3)]);
        let placement = order.place(v[1], 2, 2);
        assert_eq!(placement.assigned, 2);
        assert!(placement.displaced.is_none());
        assert!(order.is_contiguous());
    }

    #[test]
    fn cross_course_move_clamps_to_append_slot() {
        let v = ids(3);
        let mut order = CourseOrder::new([(v[0], 1), (v[1], 2)]);
        let placement = order.place(v[2], 3, 50);
        assert_eq!(placement.assigned, 3);
        assert!(placement.displaced.is_none());
    }

    #[test]
    fn same_course_move_past_end_takes_the_last_slot() {
        // A(1), B(2), C(3); move B far beyond the end -> B swaps with C,
        // the course stays dense.
        let v = ids(3);
        let mut order = CourseOrder::new([(v[0], 1), (v[2], 3)]);
        let placement = order.place(v[1], 2, 50);

        assert_eq!(placement.assigned, 3);
        assert_eq!(
            placement.displaced,
            Some(Reassignment {
                video_id: v[2],
                priority: 2
            })
        );
        assert!(order.is_contiguous());
    }

    #[test]
    fn cross_course_move_can_leave_duplicate_in_target() {
        // Known gap, kept on purpose: the occupant inherits the mover's old
        // priority from the SOURCE course, which may collide in the target.
        let v = ids(2);
        let mut order = CourseOrder::new([(v[0], 1), (v[1], 2)]);
        let mover = Uuid::new_v4();
        // mover held priority 1 in its old course, lands on slot 2 here.
        let placement = order.place(mover, 1, 2);

        assert_eq!(placement.assigned, 2);
        assert_eq!(
            placement.displaced,
            Some(Reassignment {
                video_id: v[1],
                priority: 1
            })
        );
        assert!(!order.is_contiguous());
        assert_eq!(order.priorities(), vec![1, 1, 2]);
    }

    #[test]
    fn swap_adjacent_down_then_up_is_identity() {
        let v = ids(3);
        let mut order = order_of(&v);
        order.swap_adjacent(v[1], SwapDirection::Down).unwrap();
        assert_eq!(order.priority_of(v[1]), Some(3));
        assert_eq!(order.priority_of(v[2]), Some(2));

        order.swap_adjacent(v[1], SwapDirection::Up).unwrap();
        assert_eq!(order.priority_of(v[1]), Some(2));
        assert_eq!(order.priority_of(v[2]), Some(3));
        assert!(order.is_contiguous());
    }

    #[test]
    fn swap_at_boundary_reports_no_target() {
        let v = ids(2);
        let mut order = order_of(&v);
        let head = order.swap_adjacent(v[0], SwapDirection::Up);
        assert!(matches!(head, Err(AppError::NoSwapTarget)));
        let tail = order.swap_adjacent(v[1], SwapDirection::Down);
        assert!(matches!(tail, Err(AppError::NoSwapTarget)));
        // A failed swap leaves the snapshot untouched.
        assert_eq!(order.priorities(), vec![1, 2]);
    }

    #[test]
    fn swap_on_missing_video_is_not_found() {
        let mut order = order_of(&ids(2));
        let result = order.swap_adjacent(Uuid::new_v4(), SwapDirection::Up);
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[derive(Debug, Clone)]
    enum Op {
        Insert(i32),
        MoveWithin(usize, i32),
        Delete(usize),
        Swap(usize, bool),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            (-3..20i32).prop_map(Op::Insert),
            (0..16usize, -3..20i32).prop_map(|(i, p)| Op::MoveWithin(i, p)),
            (0..16usize).prop_map(Op::Delete),
            (0..16usize, any::<bool>()).prop_map(|(i, up)| Op::Swap(i, up)),
        ]
    }

    proptest! {
        /// Any sequence of single-course inserts, moves, deletes, and swaps
        /// keeps the priority set dense and duplicate-free.
        #[test]
        fn operation_sequences_preserve_contiguity(ops in proptest::collection::vec(op_strategy(), 1..40)) {
            let mut order = CourseOrder::default();
            let mut known: Vec<Uuid> = Vec::new();

            for op in ops {
                match op {
                    Op::Insert(desired) => {
                        let id = Uuid::new_v4();
                        order.insert(id, desired);
                        known.push(id);
                    }
                    Op::MoveWithin(i, desired) => {
                        if known.is_empty() { continue; }
                        let id = known[i % known.len()];
                        let old = order.priority_of(id).unwrap();
                        // Same-course move: rebuild the snapshot without the mover.
                        let mut without: CourseOrder = CourseOrder::new(
                            order.slots.iter().copied().filter(|&(vid, _)| vid != id)
                        );
                        without.place(id, old, desired);
                        order = without;
                    }
                    Op::Delete(i) => {
                        if known.is_empty() { continue; }
                        let id = known.remove(i % known.len());
                        order.remove(id);
                    }
                    Op::Swap(i, up) => {
                        if known.is_empty() { continue; }
                        let id = known[i % known.len()];
                        let direction = if up { SwapDirection::Up } else { SwapDirection::Down };
                        // Boundary swaps legitimately fail; anything else must succeed.
                        let _ = order.swap_adjacent(id, direction);
                    }
                }

                prop_assert!(order.is_contiguous(), "priorities {:?} not contiguous", order.priorities());
                prop_assert_eq!(order.len(), known.len());
            }
        }

        /// A successful adjacent swap is always its own inverse.
        #[test]
        fn swap_is_involution(n in 2..8usize, pick in 0..8usize, up in any::<bool>()) {
            let vids = ids(n);
            let mut order = order_of(&vids);
            let before = order.slots.clone();
            let id = vids[pick % n];
            let direction = if up { SwapDirection::Up } else { SwapDirection::Down };
            let inverse = if up { SwapDirection::Down } else { SwapDirection::Up };

            if order.swap_adjacent(id, direction).is_ok() {
                order.swap_adjacent(id, inverse).unwrap();
                prop_assert_eq!(order.slots.clone(), before);
            }
        }
    }
}
