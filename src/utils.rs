//! utils — conversion helpers for the PyO3 binding layer.
//!
//! Everything here is compiled only with the `python-bindings` feature and
//! turns Python objects (numpy arrays, pandas Series, plain sequences) into
//! the Rust types the core modules expect.
#[cfg(feature = "python-bindings")]
use ndarray::Array3;

#[cfg(feature = "python-bindings")]
use pyo3::{exceptions::PyValueError, prelude::*, types::PyAny};

#[cfg(feature = "python-bindings")]
use crate::simulation::CosmoParams;

#[cfg(feature = "python-bindings")]
use numpy::{
    IntoPyArray,    // Vec → PyArray
    PyArrayMethods, // .readonly()
    PyReadonlyArray1,
    PyReadonlyArray3,
};

/// Borrow a 1-D contiguous `float64` view of `raw_data`, copying only when
/// the input is not already such an array.
#[cfg(feature = "python-bindings")]
#[inline]
pub fn extract_f64_array<'py>(
    py: Python<'py>, raw_data: &Bound<'py, PyAny>,
) -> PyResult<PyReadonlyArray1<'py, f64>> {
    if let Ok(arr_ro) = raw_data.extract::<PyReadonlyArray1<f64>>() {
        if arr_ro.as_slice().is_ok() {
            return Ok(arr_ro);
        }
    }

    if let Ok(obj) = raw_data.call_method("to_numpy", (false,), None) {
        if let Ok(series_ro) = obj.extract::<PyReadonlyArray1<f64>>() {
            if series_ro.as_slice().is_ok() {
                return Ok(series_ro);
            }
        }
    }

    let vec: Vec<f64> = raw_data.extract().map_err(|_| {
        pyo3::exceptions::PyTypeError::new_err(
            "expected a 1-D numpy.ndarray, pandas.Series, or sequence of float64",
        )
    })?;
    Ok(vec.into_pyarray(py).readonly())
}

/// Copy a 1-D array-like into an owned vector, naming `what` in errors.
#[cfg(feature = "python-bindings")]
pub fn extract_f64_vec<'py>(
    py: Python<'py>, raw_data: &Bound<'py, PyAny>, what: &str,
) -> PyResult<Vec<f64>> {
    let arr = extract_f64_array(py, raw_data)?;
    let slice = arr
        .as_slice()
        .map_err(|_| PyValueError::new_err(format!("{what} must be a contiguous 1-D float64 array")))?;
    Ok(slice.to_vec())
}

/// Copy a 3-D `float64` numpy array (e.g. a lightcone box) into an owned
/// `Array3`.
#[cfg(feature = "python-bindings")]
pub fn extract_box<'py>(raw_data: &Bound<'py, PyAny>, what: &str) -> PyResult<Array3<f64>> {
    let arr = raw_data
        .extract::<PyReadonlyArray3<f64>>()
        .map_err(|_| PyValueError::new_err(format!("{what} must be a 3-D float64 numpy array")))?;
    Ok(arr.as_array().to_owned())
}

/// Build cosmological parameters, defaulting each missing value to Planck
/// 2015.
#[cfg(feature = "python-bindings")]
pub fn build_cosmo_params(
    hubble: Option<f64>, omega_m: Option<f64>, omega_b: Option<f64>, y_he: Option<f64>,
) -> PyResult<CosmoParams> {
    let d = CosmoParams::default();
    let params = CosmoParams::new(
        hubble.unwrap_or(d.hubble),
        omega_m.unwrap_or(d.omega_m),
        omega_b.unwrap_or(d.omega_b),
        y_he.unwrap_or(d.y_he),
    )?;
    Ok(params)
}
