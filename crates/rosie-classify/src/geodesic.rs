//! Geodesic distance on the WGS-84 ellipsoid (Vincenty's inverse formula).

const SEMI_MAJOR_AXIS_KM: f64 = 6378.137;
const FLATTENING: f64 = 1.0 / 298.257_223_563;
const SEMI_MINOR_AXIS_KM: f64 = SEMI_MAJOR_AXIS_KM * (1.0 - FLATTENING);
const MEAN_RADIUS_KM: f64 = 6371.0088;

const MAX_ITERATIONS: usize = 200;
const CONVERGENCE: f64 = 1e-12;

/// A `(latitude, longitude)` pair in decimal degrees.
pub type Coordinates = (f64, f64);

/// Distance in km between two points.
///
/// Falls back to the great-circle distance on a sphere for nearly antipodal
/// points, where Vincenty's iteration does not converge.
pub fn distance_km(a: Coordinates, b: Coordinates) -> f64 {
    vincenty_km(a, b).unwrap_or_else(|| great_circle_km(a, b))
}

/// Vincenty's inverse solution, or `None` when it fails to converge.
pub fn vincenty_km((lat1, lon1): Coordinates, (lat2, lon2): Coordinates) -> Option<f64> {
    if lat1 == lat2 && lon1 == lon2 {
        return Some(0.0);
    }
    let (a, b, f) = (SEMI_MAJOR_AXIS_KM, SEMI_MINOR_AXIS_KM, FLATTENING);

    let l = (lon2 - lon1).to_radians();
    let u1 = ((1.0 - f) * lat1.to_radians().tan()).atan();
    let u2 = ((1.0 - f) * lat2.to_radians().tan()).atan();
    let (sin_u1, cos_u1) = u1.sin_cos();
    let (sin_u2, cos_u2) = u2.sin_cos();

    let mut lambda = l;
    for _ in 0..MAX_ITERATIONS {
        let (sin_lambda, cos_lambda) = lambda.sin_cos();
        let sin_sigma = ((cos_u2 * sin_lambda).powi(2)
            + (cos_u1 * sin_u2 - sin_u1 * cos_u2 * cos_lambda).powi(2))
        .sqrt();
        if sin_sigma == 0.0 {
            return Some(0.0);
        }
        let cos_sigma = sin_u1 * sin_u2 + cos_u1 * cos_u2 * cos_lambda;
        let sigma = sin_sigma.atan2(cos_sigma);
        let sin_alpha = cos_u1 * cos_u2 * sin_lambda / sin_sigma;
        let cos_sq_alpha = 1.0 - sin_alpha * sin_alpha;
        // Both points on the equator.
        let cos_2sigma_m = if cos_sq_alpha == 0.0 {
            0.0
        } else {
            cos_sigma - 2.0 * sin_u1 * sin_u2 / cos_sq_alpha
        };
        let c = f / 16.0 * cos_sq_alpha * (4.0 + f * (4.0 - 3.0 * cos_sq_alpha));
        let previous = lambda;
        lambda = l
            + (1.0 - c)
                * f
                * sin_alpha
                * (sigma
                    + c * sin_sigma
                        * (cos_2sigma_m + c * cos_sigma * (-1.0 + 2.0 * cos_2sigma_m.powi(2))));

        if (lambda - previous).abs() < CONVERGENCE {
            let u_sq = cos_sq_alpha * (a * a - b * b) / (b * b);
            let big_a =
                1.0 + u_sq / 16384.0 * (4096.0 + u_sq * (-768.0 + u_sq * (320.0 - 175.0 * u_sq)));
            let big_b = u_sq / 1024.0 * (256.0 + u_sq * (-128.0 + u_sq * (74.0 - 47.0 * u_sq)));
            let delta_sigma = big_b
                * sin_sigma
                * (cos_2sigma_m
                    + big_b / 4.0
                        * (cos_sigma * (-1.0 + 2.0 * cos_2sigma_m.powi(2))
                            - big_b / 6.0
                                * cos_2sigma_m
                                * (-3.0 + 4.0 * sin_sigma.powi(2))
                                * (-3.0 + 4.0 * cos_2sigma_m.powi(2))));
            return Some(b * big_a * (sigma - delta_sigma));
        }
    }
    None
}

/// Haversine distance on a sphere of the mean Earth radius.
pub fn great_circle_km((lat1, lon1): Coordinates, (lat2, lon2): Coordinates) -> f64 {
    let (phi1, phi2) = (lat1.to_radians(), lat2.to_radians());
    let d_phi = phi2 - phi1;
    let d_lambda = (lon2 - lon1).to_radians();
    let h = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    2.0 * MEAN_RADIUS_KM * h.sqrt().min(1.0).asin()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dms(deg: f64, min: f64, sec: f64) -> f64 {
        deg.signum() * (deg.abs() + min / 60.0 + sec / 3600.0)
    }

    #[test]
    fn flinders_peak_to_buninyong() {
        let flinders = (dms(-37.0, 57.0, 3.72030), dms(144.0, 25.0, 29.52440));
        let buninyong = (dms(-37.0, 39.0, 10.15610), dms(143.0, 55.0, 35.38390));
        let km = vincenty_km(flinders, buninyong).unwrap();
        assert!((km - 54.972271).abs() < 1e-5, "{km}");
    }

    #[test]
    fn one_degree_along_the_equator() {
        let km = distance_km((0.0, 0.0), (0.0, 1.0));
        assert!((km - 111.319_491).abs() < 1e-5, "{km}");
    }

    #[test]
    fn same_point_is_zero() {
        assert_eq!(distance_km((-15.79, -47.88), (-15.79, -47.88)), 0.0);
    }

    #[test]
    fn brasilia_to_sao_paulo() {
        let km = distance_km((-15.7801, -47.9292), (-23.5505, -46.6333));
        assert!((km - great_circle_km((-15.7801, -47.9292), (-23.5505, -46.6333))).abs() < 5.0);
        assert!(km > 860.0 && km < 880.0, "{km}");
    }

    #[test]
    fn antipodal_points_fall_back() {
        let km = distance_km((0.0, 0.0), (0.5, 179.7));
        assert!(km.is_finite());
        assert!(km > 19_900.0 && km < 20_100.0, "{km}");
    }
}
