use std::fmt::Debug;
#[cfg(test)]
use std::sync::Arc;

#[cfg(test)]
use crate::pal::MockVirtualMemory;
use crate::pal::{BuildTargetVm, VirtualMemory};

/// Enum to hide the real/mock choice behind a single wrapper type.
#[derive(Clone, Debug)]
pub(crate) enum VmFacade {
    Target(&'static BuildTargetVm),

    #[cfg(test)]
    Mock(Arc<MockVirtualMemory>),
}

impl VmFacade {
    pub(crate) const fn target() -> Self {
        Self::Target(&BuildTargetVm)
    }

    #[cfg(test)]
    pub(crate) fn from_mock(mock: MockVirtualMemory) -> Self {
        Self::Mock(Arc::new(mock))
    }
}

impl VirtualMemory for VmFacade {
    fn allocate(&self, len: usize) -> usize {
        match self {
            Self::Target(vm) => vm.allocate(len),
            #[cfg(test)]
            Self::Mock(mock) => mock.allocate(len),
        }
    }

    fn reserve(&self, len: usize) -> usize {
        match self {
            Self::Target(vm) => vm.reserve(len),
            #[cfg(test)]
            Self::Mock(mock) => mock.reserve(len),
        }
    }

    fn commit(&self, addr: usize, len: usize) {
        match self {
            Self::Target(vm) => vm.commit(addr, len),
            #[cfg(test)]
            Self::Mock(mock) => mock.commit(addr, len),
        }
    }

    fn release(&self, addr: usize, len: usize) {
        match self {
            Self::Target(vm) => vm.release(addr, len),
            #[cfg(test)]
            Self::Mock(mock) => mock.release(addr, len),
        }
    }
}
