quantity!(
    /// Day-ahead wholesale price, as published in the `Price (EUR/MWhe)` column.
    MegawattHourPrice, via: f64, suffix: "€/MWh", precision: 2
);
