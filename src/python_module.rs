//! Python bindings for bloom-registry using PyO3

use crate::{BloomError, BloomFilter, FilterLimits, HashScheme, NewFilter};
use numpy::{IntoPyArray, PyArray1};
use pyo3::create_exception;
use pyo3::exceptions::{PyKeyError, PyValueError};
use pyo3::prelude::*;

create_exception!(bloom_registry, ElementNotFoundError, PyKeyError);

fn to_py_err(err: BloomError) -> PyErr {
    match err {
        BloomError::ElementNotFound => ElementNotFoundError::new_err(err.to_string()),
        other => PyValueError::new_err(other.to_string()),
    }
}

/// Python wrapper for BloomFilter
#[pyclass(name = "BloomFilter")]
struct PyBloomFilter {
    inner: BloomFilter,
}

#[pymethods]
impl PyBloomFilter {
    #[new]
    #[pyo3(signature = (name, size, num_hashes, scheme = "fnv1a"))]
    fn new(name: String, size: u32, num_hashes: u8, scheme: &str) -> PyResult<Self> {
        let scheme = match scheme {
            "fnv1a" => HashScheme::Fnv1a,
            "sip13" => HashScheme::Sip13,
            other => {
                return Err(PyValueError::new_err(format!(
                    "unknown hash scheme '{}', expected 'fnv1a' or 'sip13'",
                    other
                )))
            }
        };

        let new_filter = NewFilter::new(name, size, num_hashes).with_scheme(scheme);
        let inner = BloomFilter::init(new_filter, &FilterLimits::default()).map_err(to_py_err)?;
        Ok(PyBloomFilter { inner })
    }

    /// Restore a filter from account bytes
    #[staticmethod]
    fn from_bytes(data: &[u8]) -> PyResult<Self> {
        let inner = BloomFilter::from_bytes(data).map_err(to_py_err)?;
        Ok(PyBloomFilter { inner })
    }

    fn to_bytes(&self) -> PyResult<Vec<u8>> {
        self.inner.to_bytes().map_err(to_py_err)
    }

    fn add(&mut self, element: &[u8]) -> PyResult<()> {
        self.inner.add(element).map_err(to_py_err)
    }

    /// Raises ElementNotFoundError when the element is definitely absent
    fn check(&self, element: &[u8]) -> PyResult<()> {
        self.inner.check(element).map_err(to_py_err)
    }

    fn __contains__(&self, element: &[u8]) -> bool {
        self.inner.contains(element)
    }

    #[getter]
    fn name(&self) -> String {
        self.inner.name().to_string()
    }

    #[getter]
    fn m(&self) -> u32 {
        self.inner.m()
    }

    #[getter]
    fn k(&self) -> u8 {
        self.inner.k()
    }

    #[getter]
    fn n(&self) -> u32 {
        self.inner.n()
    }

    #[getter]
    fn false_positive_rate(&self) -> f64 {
        self.inner.false_positive_rate()
    }

    fn bit_array<'py>(&self, py: Python<'py>) -> &'py PyArray1<bool> {
        self.inner.bit_array().into_pyarray(py)
    }

    fn __str__(&self) -> String {
        self.inner.stats().to_string()
    }

    fn __repr__(&self) -> String {
        format!(
            "BloomFilter(name='{}', m={}, k={}, n={})",
            self.inner.name(),
            self.inner.m(),
            self.inner.k(),
            self.inner.n()
        )
    }
}

/// Python module definition
#[pymodule]
fn bloom_registry(py: Python, m: &PyModule) -> PyResult<()> {
    m.add_class::<PyBloomFilter>()?;
    m.add("ElementNotFoundError", py.get_type::<ElementNotFoundError>())?;

    m.add("MAX_FILTER_BITS", crate::MAX_FILTER_BITS)?;
    m.add("MAX_NAME_LEN", crate::MAX_NAME_LEN)?;
    m.add("__version__", "0.1.0")?;

    Ok(())
}
