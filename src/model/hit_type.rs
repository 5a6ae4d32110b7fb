use bitflags::bitflags;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HitType(u32);

bitflags! {
    impl HitType: u32 {
        const Entity = 1 << 0;
        const Brush = 1 << 1;
        const Patch = 1 << 2;
    }
}

/// Hit types of anything a pick ray can land on in the scene graph.
pub fn node_hit_type() -> HitType {
    HitType::Entity | HitType::Brush | HitType::Patch
}
