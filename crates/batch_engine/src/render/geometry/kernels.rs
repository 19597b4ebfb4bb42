//! Copy kernels
//!
//! Monomorphized element copy routines. The pack plan picks one kernel per
//! redirect when it is compiled, so the per-vertex loop never dispatches on
//! element types.

use bytemuck::Pod;

use crate::render::layout::{CopyMode, ElementType};

/// Copies `count` destination elements from `src` into `dst`
///
/// `src` and `dst` are exactly as long as the kernel reads and writes.
pub(crate) type CopyKernel = fn(src: &[u8], dst: &mut [u8], count: usize);

/// Writes one integer value as a destination element
pub(crate) type ValueWriter = fn(value: u32, dst: &mut [u8]);

/// Numeric element that can pass through the f64 conversion path
///
/// Every supported element type is exactly representable as `f64`. Float to
/// integer conversion saturates at the destination range and maps NaN to zero.
pub(crate) trait Element: Pod {
    fn to_f64(self) -> f64;
    fn from_f64(value: f64) -> Self;
}

macro_rules! impl_element {
    ($($ty:ty),*) => {
        $(
            impl Element for $ty {
                #[inline]
                fn to_f64(self) -> f64 {
                    f64::from(self)
                }

                #[inline]
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_lossless)]
                fn from_f64(value: f64) -> Self {
                    value as $ty
                }
            }
        )*
    };
}

impl_element!(i8, u8, i16, u16, i32, u32, f32);

fn copy_bytes(src: &[u8], dst: &mut [u8], _count: usize) {
    dst.copy_from_slice(src);
}

fn convert<S: Element, D: Element>(src: &[u8], dst: &mut [u8], count: usize) {
    let src_size = std::mem::size_of::<S>();
    let dst_size = std::mem::size_of::<D>();

    for i in 0..count {
        let value: S = bytemuck::pod_read_unaligned(&src[i * src_size..(i + 1) * src_size]);
        let converted = D::from_f64(value.to_f64());
        dst[i * dst_size..(i + 1) * dst_size].copy_from_slice(bytemuck::bytes_of(&converted));
    }
}

fn write_value<D: Element>(value: u32, dst: &mut [u8]) {
    let converted = D::from_f64(f64::from(value));
    dst.copy_from_slice(bytemuck::bytes_of(&converted));
}

macro_rules! convert_to {
    ($src:ty, $dst:expr) => {
        match $dst {
            ElementType::Int8 => convert::<$src, i8> as CopyKernel,
            ElementType::Uint8 => convert::<$src, u8>,
            ElementType::Int16 => convert::<$src, i16>,
            ElementType::Uint16 => convert::<$src, u16>,
            ElementType::Int32 => convert::<$src, i32>,
            ElementType::Uint32 => convert::<$src, u32>,
            ElementType::Float32 => convert::<$src, f32>,
        }
    };
}

/// Select the kernel for a redirect's element types and copy mode
pub(crate) fn select_kernel(mode: CopyMode, src: ElementType, dst: ElementType) -> CopyKernel {
    if mode == CopyMode::Reinterpret || src == dst {
        return copy_bytes;
    }

    match src {
        ElementType::Int8 => convert_to!(i8, dst),
        ElementType::Uint8 => convert_to!(u8, dst),
        ElementType::Int16 => convert_to!(i16, dst),
        ElementType::Uint16 => convert_to!(u16, dst),
        ElementType::Int32 => convert_to!(i32, dst),
        ElementType::Uint32 => convert_to!(u32, dst),
        ElementType::Float32 => convert_to!(f32, dst),
    }
}

/// Select the writer for index-like attributes (texture units, uniform ids)
pub(crate) fn select_writer(dst: ElementType) -> ValueWriter {
    match dst {
        ElementType::Int8 => write_value::<i8>,
        ElementType::Uint8 => write_value::<u8>,
        ElementType::Int16 => write_value::<i16>,
        ElementType::Uint16 => write_value::<u16>,
        ElementType::Int32 => write_value::<i32>,
        ElementType::Uint32 => write_value::<u32>,
        ElementType::Float32 => write_value::<f32>,
    }
}
