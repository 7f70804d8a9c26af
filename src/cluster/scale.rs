use ndarray::{Array2, Axis};

/// Standardize each column to zero mean and unit variance.
///
/// Statistics are the population mean and variance of `data` itself.
/// Columns without variance become all zeros.
///
/// # Example
/// ```
/// use ndarray::array;
/// use segsift::cluster::standardize;
///
/// let z = standardize(&array![[1.0, 5.0], [3.0, 5.0]]);
/// assert_eq!(z, array![[-1.0, 0.0], [1.0, 0.0]]);
/// ```
pub fn standardize(data: &Array2<f32>) -> Array2<f32> {
    let mut out = data.clone();
    if data.nrows() == 0 {
        return out;
    }
    for mut col in out.axis_iter_mut(Axis(1)) {
        let n = col.len() as f64;
        let mean = col.iter().map(|&v| v as f64).sum::<f64>() / n;
        let var = col.iter().map(|&v| (v as f64 - mean).powi(2)).sum::<f64>() / n;
        let std = var.sqrt();
        if std <= 1e-12 {
            col.fill(0.0);
        } else {
            col.mapv_inplace(|v| ((v as f64 - mean) / std) as f32);
        }
    }
    out
}
