use super::{Error, Result};
use ndarray::{Array3, ArrayView2, Axis, ShapeBuilder};
use std::path::Path;

/// A dense 3D snapshot of one simulation variable
///
/// Each axis indexes a sequence of 2D slices; the renderer gives no axis any
/// further meaning.
#[derive(Debug, Clone, PartialEq)]
pub struct Volume {
    data: Array3<f64>,
}

impl From<Array3<f64>> for Volume {
    fn from(data: Array3<f64>) -> Self {
        Self { data }
    }
}

impl Volume {
    /// Returns the array dimensions `[D0, D1, D2]`
    pub fn shape(&self) -> [usize; 3] {
        let (d0, d1, d2) = self.data.dim();
        [d0, d1, d2]
    }
    /// Returns the number of slices along `axis`
    pub fn len_of(&self, axis: usize) -> Result<usize> {
        Ok(self.data.len_of(checked_axis(axis)?))
    }
    /// Returns the 2D cross-section at `index` along `axis`
    ///
    /// The two remaining axes, in order, are the rows and columns of the slice.
    pub fn slice(&self, axis: usize, index: usize) -> Result<ArrayView2<'_, f64>> {
        let ax = checked_axis(axis)?;
        let n = self.data.len_of(ax);
        if index >= n {
            return Err(Error::InvalidArgument(format!(
                "slice index {index} out of range for axis {axis} of length {n}"
            )));
        }
        let slice = self.data.index_axis(ax, index);
        if slice.is_empty() {
            return Err(Error::InvalidArgument(format!(
                "slice {index} along axis {axis} of a {:?} volume is empty",
                self.shape()
            )));
        }
        Ok(slice)
    }
    /// Returns the minimum and maximum of the finite values, if there are any
    pub fn finite_range(&self) -> Option<(f64, f64)> {
        self.data
            .iter()
            .filter(|x| x.is_finite())
            .fold(None, |range, &x| match range {
                None => Some((x, x)),
                Some((lo, hi)) => Some((lo.min(x), hi.max(x))),
            })
    }
    #[cfg(test)]
    pub(crate) fn data(&self) -> &Array3<f64> {
        &self.data
    }
}

fn checked_axis(axis: usize) -> Result<Axis> {
    if axis > 2 {
        return Err(Error::InvalidArgument(format!(
            "axis must be 0, 1, or 2, found {axis}"
        )));
    }
    Ok(Axis(axis))
}

/// Interface to on-disk array files
pub trait ArrayLoader {
    /// Loads the array stored at `path`
    fn load(&self, path: &Path) -> Result<Volume>;
}

/// Numpy `.npy` array loader
///
/// Reads `f8` or `f4` arrays in either C or Fortran order.
#[derive(Debug, Default, Clone, Copy)]
pub struct NpyLoader;

impl ArrayLoader for NpyLoader {
    fn load(&self, path: &Path) -> Result<Volume> {
        let bytes = std::fs::read(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => Error::FileNotFound(path.to_path_buf()),
            _ => Error::Read(e),
        })?;
        parse_npy(path, &bytes)
    }
}

fn parse_npy(path: &Path, bytes: &[u8]) -> Result<Volume> {
    let parse_error = |reason: String| Error::Parse {
        path: path.to_path_buf(),
        reason,
    };
    let npy = npyz::NpyFile::new(bytes).map_err(|e| parse_error(e.to_string()))?;
    let shape = npy.shape().to_vec();
    let fortran = matches!(npy.order(), npyz::Order::Fortran);
    let dtype = format!("{:?}", npy.dtype());
    let [d0, d1, d2] = shape[..] else {
        return Err(parse_error(format!(
            "expected a 3D array, found shape {shape:?}"
        )));
    };
    let data: Vec<f64> = match npy.into_vec::<f64>() {
        Ok(data) => data,
        // the header parsed once already, only the element type can differ
        Err(_) => npyz::NpyFile::new(bytes)?
            .into_vec::<f32>()
            .map_err(|_| parse_error(format!("unsupported dtype {dtype}")))?
            .into_iter()
            .map(f64::from)
            .collect(),
    };
    let dim = (d0 as usize, d1 as usize, d2 as usize);
    let data = if fortran {
        Array3::from_shape_vec(dim.f(), data)?
    } else {
        Array3::from_shape_vec(dim, data)?
    };
    Ok(Volume::from(data))
}
