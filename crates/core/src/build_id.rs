//! Build id (§3 Build context): the opaque identifier for one top-level
//! `redux` invocation, shared with descendant rule processes via
//! `REDUX_BUILD_ID` (§6) so a probe connection can be matched back to the
//! coordinator that spawned it.

crate::define_id! {
    #[derive(Default)]
    pub struct BuildId;
}

impl BuildId {
    pub fn generate(gen: &impl crate::id::IdGen) -> Self {
        Self::new(gen.next())
    }
}
