//! Dependency relations between VMs.

use indexmap::IndexMap;

/// Directed "depends on" relation between VMs, maintained in both directions
/// for O(1) lookup either way.
///
/// The relation is advisory metadata for planning policies; it is not
/// consulted by migration admission or completion.
#[derive(Default)]
pub struct VmDependencyGraph {
    prerequisites: IndexMap<u32, Vec<u32>>,
    dependents: IndexMap<u32, Vec<u32>>,
}

impl VmDependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that `dependent` relies on `prerequisite`.
    pub fn add_dependency(&mut self, dependent: u32, prerequisite: u32) {
        self.prerequisites.entry(dependent).or_default().push(prerequisite);
        self.dependents.entry(prerequisite).or_default().push(dependent);
    }

    /// Returns the VMs the specified VM depends on, in insertion order.
    pub fn get_prerequisites(&self, vm_id: u32) -> &[u32] {
        self.prerequisites.get(&vm_id).map_or(&[], |deps| deps.as_slice())
    }

    /// Returns the VMs depending on the specified VM, in insertion order.
    pub fn get_dependents(&self, vm_id: u32) -> &[u32] {
        self.dependents.get(&vm_id).map_or(&[], |deps| deps.as_slice())
    }

    /// Returns true if the VM takes part in the relation in either direction.
    pub fn has_dependencies(&self, vm_id: u32) -> bool {
        !self.get_prerequisites(vm_id).is_empty() || !self.get_dependents(vm_id).is_empty()
    }
}
