use crate::records::HealthRes;

/// Simple health service shared by every front-end.
#[derive(Clone, Default)]
pub struct HealthService;

impl HealthService {
    /// Reports the service as healthy.
    ///
    /// A process that can answer at all has its store and thumbnail directories, because both
    /// are created before any front-end starts serving.
    pub fn check_health() -> HealthRes {
        HealthRes {
            ok: true,
            message: "filedrop is alive".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_ok() {
        let res = HealthService::check_health();
        assert!(res.ok);
        assert_eq!(res.message, "filedrop is alive");
    }
}
