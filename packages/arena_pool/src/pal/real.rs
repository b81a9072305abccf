use std::ptr;
use std::sync::OnceLock;

use crate::pal::VirtualMemory;

/// Virtual-memory bindings that target the real operating system.
///
/// Only unit tests that need precise control over commit behavior use
/// anything else; everywhere possible the real bindings are preferred for
/// maximum realism.
#[derive(Debug, Default)]
pub(crate) struct BuildTargetVm;

fn page_size() -> usize {
    static PAGE_SIZE: OnceLock<usize> = OnceLock::new();
    *PAGE_SIZE.get_or_init(|| {
        // SAFETY: sysconf has no preconditions.
        let raw = unsafe { libc::sysconf(libc::_SC_PAGE_SIZE) };
        assert!(raw > 0, "sysconf(_SC_PAGE_SIZE) failed");
        raw as usize
    })
}

/// Widens `(addr, len)` outward so both ends land on page boundaries.
fn page_span(addr: usize, len: usize) -> (usize, usize) {
    let page = page_size();
    let base = addr & !(page - 1);
    (base, len + (addr - base))
}

impl VirtualMemory for BuildTargetVm {
    fn allocate(&self, len: usize) -> usize {
        // SAFETY: Anonymous private mapping with no address hint; arguments
        // are valid for any `len`.
        let mapped = unsafe {
            libc::mmap(
                ptr::null_mut(),
                len,
                libc::PROT_READ | libc::PROT_WRITE,
                libc::MAP_PRIVATE | libc::MAP_ANONYMOUS | libc::MAP_NORESERVE,
                -1,
                0,
            )
        };
        assert!(mapped != libc::MAP_FAILED, "mmap of {len} bytes failed");
        mapped as usize
    }

    fn reserve(&self, len: usize) -> usize {
        // PROT_NONE keeps the range addressable but unbacked until commit.
        // SAFETY: Anonymous private mapping with no address hint.
        let mapped = unsafe {
            libc::mmap(
                ptr::null_mut(),
                len,
                libc::PROT_NONE,
                libc::MAP_PRIVATE | libc::MAP_ANONYMOUS | libc::MAP_NORESERVE,
                -1,
                0,
            )
        };
        assert!(
            mapped != libc::MAP_FAILED,
            "reservation of {len} bytes of address space failed"
        );
        mapped as usize
    }

    fn commit(&self, addr: usize, len: usize) {
        let (base, widened) = page_span(addr, len);
        // SAFETY: `base` is page-aligned and lies inside a mapping created by
        // `reserve()`; mprotect on such a range has no other preconditions.
        let result = unsafe { libc::mprotect(base as *mut libc::c_void, widened, libc::PROT_READ | libc::PROT_WRITE) };
        assert!(result == 0, "commit of {widened} bytes at {base:#x} failed");
    }

    fn release(&self, addr: usize, len: usize) {
        let (base, widened) = page_span(addr, len);
        // SAFETY: `base`/`widened` cover a mapping previously returned by
        // `allocate()` or `reserve()`.
        let result = unsafe { libc::munmap(base as *mut libc::c_void, widened) };
        assert!(result == 0, "munmap of {widened} bytes at {base:#x} failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_span_widens_to_boundaries() {
        let page = page_size();
        assert!(page.is_power_of_two());

        let (base, len) = page_span(page + 7, 1);
        assert_eq!(base, page);
        assert_eq!(len, 8);

        let (base, len) = page_span(page, page);
        assert_eq!(base, page);
        assert_eq!(len, page);
    }

    #[test]
    fn reserve_commit_release_round_trip() {
        let vm = BuildTargetVm;
        let page = page_size();

        let base = vm.reserve(4 * page);
        vm.commit(base, 2 * page);

        // The committed prefix must be writable and readable.
        // SAFETY: We just committed these pages and nothing else maps them.
        unsafe {
            let bytes = base as *mut u8;
            bytes.write(0xA5);
            bytes.add(2 * page - 1).write(0x5A);
            assert_eq!(bytes.read(), 0xA5);
            assert_eq!(bytes.add(2 * page - 1).read(), 0x5A);
        }

        vm.release(base, 4 * page);
    }

    #[test]
    fn allocate_returns_writable_memory() {
        let vm = BuildTargetVm;
        let base = vm.allocate(64);

        // SAFETY: Freshly mapped read/write memory, unshared.
        unsafe {
            (base as *mut u8).write(1);
            assert_eq!((base as *mut u8).read(), 1);
        }

        vm.release(base, 64);
    }
}
