use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::core::vm::{VirtualMachine, VmStatus};

/// Keeps track of all VMs in the simulation.
pub struct VmRegistry {
    vms: HashMap<u32, Rc<RefCell<VirtualMachine>>>,
}

impl VmRegistry {
    pub fn new() -> Self {
        Self { vms: HashMap::new() }
    }

    /// Registers a new VM.
    ///
    /// Panics if a VM with the same ID is already registered.
    pub fn register_new_vm(&mut self, vm: VirtualMachine) -> Rc<RefCell<VirtualMachine>> {
        let vm_ref = Rc::new(RefCell::new(vm));
        let prev = self.vms.insert(vm_ref.borrow().id, vm_ref.clone());
        assert!(prev.is_none(), "duplicate VM id {}", vm_ref.borrow().id);
        vm_ref
    }

    /// Returns the VM by its ID.
    ///
    /// Panics if there is no such VM.
    pub fn get_vm(&self, vm_id: u32) -> Rc<RefCell<VirtualMachine>> {
        self.vms.get(&vm_id).unwrap().clone()
    }

    pub fn get_vm_status(&self, vm_id: u32) -> VmStatus {
        self.vms.get(&vm_id).unwrap().borrow().status
    }

    pub fn contains(&self, vm_id: u32) -> bool {
        self.vms.contains_key(&vm_id)
    }

    pub fn vm_count(&self) -> usize {
        self.vms.len()
    }
}

impl Default for VmRegistry {
    fn default() -> Self {
        Self::new()
    }
}
