/// Configuration supplied when building a [`super::NestedSet`].
#[derive(Clone, Debug)]
pub struct NestedSetOptions {
    /// Run the full forest checker inside the transaction after every mutation.
    pub verify_after_mutation: bool,
    /// Re-read the ancestor chain of the touched node before returning.
    pub refresh_ancestors: bool,
}

impl Default for NestedSetOptions {
    fn default() -> Self {
        Self {
            verify_after_mutation: cfg!(debug_assertions),
            refresh_ancestors: true,
        }
    }
}

impl NestedSetOptions {
    /// Enables or disables the post-mutation invariant check.
    pub fn verify_after_mutation(mut self, enabled: bool) -> Self {
        self.verify_after_mutation = enabled;
        self
    }

    /// Enables or disables refreshing the ancestor chain.
    pub fn refresh_ancestors(mut self, enabled: bool) -> Self {
        self.refresh_ancestors = enabled;
        self
    }
}
