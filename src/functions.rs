//! The built-in function registry.
//!
//! A closed, hand-maintained mirror of the PromQL built-in catalog. Every
//! function the grammar can produce has exactly one [`Function`] variant,
//! and [`lookup_function`] is an exhaustive match over that enum: adding a
//! variant without giving it a signature fails at compile time, which is the
//! failure mode we want for registry drift (rather than a runtime lookup
//! silently returning nothing).

use crate::types::ValueType;

/// The declared shape of a built-in function.
///
/// `variadic` encodes the arity pattern: `0` is fixed arity, a positive `n`
/// means the last `n` declared arguments are optional, and `-1` means an
/// unbounded number of trailing arguments of the last declared type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FunctionSignature {
    pub name: &'static str,
    pub arg_types: &'static [ValueType],
    pub variadic: i32,
    pub return_type: ValueType,
}

/// Every built-in function callable in the grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Function {
    Abs,
    Absent,
    AbsentOverTime,
    Acos,
    Acosh,
    Asin,
    Asinh,
    Atan,
    Atanh,
    AvgOverTime,
    Ceil,
    Changes,
    Clamp,
    ClampMax,
    ClampMin,
    Cos,
    Cosh,
    CountOverTime,
    DaysInMonth,
    DayOfMonth,
    DayOfWeek,
    DayOfYear,
    Deg,
    Delta,
    Deriv,
    Exp,
    Floor,
    HistogramCount,
    HistogramFraction,
    HistogramQuantile,
    HistogramSum,
    HoltWinters,
    Hour,
    Idelta,
    Increase,
    Irate,
    LabelJoin,
    LabelReplace,
    LastOverTime,
    Ln,
    Log10,
    Log2,
    MaxOverTime,
    MinOverTime,
    Minute,
    Month,
    Pi,
    PredictLinear,
    PresentOverTime,
    QuantileOverTime,
    Rad,
    Rate,
    Resets,
    Round,
    Scalar,
    Sgn,
    Sin,
    Sinh,
    Sort,
    SortDesc,
    Sqrt,
    StddevOverTime,
    StdvarOverTime,
    SumOverTime,
    Tan,
    Tanh,
    Time,
    Timestamp,
    Vector,
    Year,
}

impl Function {
    /// All registry entries, in catalog order.
    pub const ALL: [Function; 70] = [
        Function::Abs,
        Function::Absent,
        Function::AbsentOverTime,
        Function::Acos,
        Function::Acosh,
        Function::Asin,
        Function::Asinh,
        Function::Atan,
        Function::Atanh,
        Function::AvgOverTime,
        Function::Ceil,
        Function::Changes,
        Function::Clamp,
        Function::ClampMax,
        Function::ClampMin,
        Function::Cos,
        Function::Cosh,
        Function::CountOverTime,
        Function::DaysInMonth,
        Function::DayOfMonth,
        Function::DayOfWeek,
        Function::DayOfYear,
        Function::Deg,
        Function::Delta,
        Function::Deriv,
        Function::Exp,
        Function::Floor,
        Function::HistogramCount,
        Function::HistogramFraction,
        Function::HistogramQuantile,
        Function::HistogramSum,
        Function::HoltWinters,
        Function::Hour,
        Function::Idelta,
        Function::Increase,
        Function::Irate,
        Function::LabelJoin,
        Function::LabelReplace,
        Function::LastOverTime,
        Function::Ln,
        Function::Log10,
        Function::Log2,
        Function::MaxOverTime,
        Function::MinOverTime,
        Function::Minute,
        Function::Month,
        Function::Pi,
        Function::PredictLinear,
        Function::PresentOverTime,
        Function::QuantileOverTime,
        Function::Rad,
        Function::Rate,
        Function::Resets,
        Function::Round,
        Function::Scalar,
        Function::Sgn,
        Function::Sin,
        Function::Sinh,
        Function::Sort,
        Function::SortDesc,
        Function::Sqrt,
        Function::StddevOverTime,
        Function::StdvarOverTime,
        Function::SumOverTime,
        Function::Tan,
        Function::Tanh,
        Function::Time,
        Function::Timestamp,
        Function::Vector,
        Function::Year,
    ];

    /// The identifier this function is called by in query text.
    pub fn name(&self) -> &'static str {
        match self {
            Function::Abs => "abs",
            Function::Absent => "absent",
            Function::AbsentOverTime => "absent_over_time",
            Function::Acos => "acos",
            Function::Acosh => "acosh",
            Function::Asin => "asin",
            Function::Asinh => "asinh",
            Function::Atan => "atan",
            Function::Atanh => "atanh",
            Function::AvgOverTime => "avg_over_time",
            Function::Ceil => "ceil",
            Function::Changes => "changes",
            Function::Clamp => "clamp",
            Function::ClampMax => "clamp_max",
            Function::ClampMin => "clamp_min",
            Function::Cos => "cos",
            Function::Cosh => "cosh",
            Function::CountOverTime => "count_over_time",
            Function::DaysInMonth => "days_in_month",
            Function::DayOfMonth => "day_of_month",
            Function::DayOfWeek => "day_of_week",
            Function::DayOfYear => "day_of_year",
            Function::Deg => "deg",
            Function::Delta => "delta",
            Function::Deriv => "deriv",
            Function::Exp => "exp",
            Function::Floor => "floor",
            Function::HistogramCount => "histogram_count",
            Function::HistogramFraction => "histogram_fraction",
            Function::HistogramQuantile => "histogram_quantile",
            Function::HistogramSum => "histogram_sum",
            Function::HoltWinters => "holt_winters",
            Function::Hour => "hour",
            Function::Idelta => "idelta",
            Function::Increase => "increase",
            Function::Irate => "irate",
            Function::LabelJoin => "label_join",
            Function::LabelReplace => "label_replace",
            Function::LastOverTime => "last_over_time",
            Function::Ln => "ln",
            Function::Log10 => "log10",
            Function::Log2 => "log2",
            Function::MaxOverTime => "max_over_time",
            Function::MinOverTime => "min_over_time",
            Function::Minute => "minute",
            Function::Month => "month",
            Function::Pi => "pi",
            Function::PredictLinear => "predict_linear",
            Function::PresentOverTime => "present_over_time",
            Function::QuantileOverTime => "quantile_over_time",
            Function::Rad => "rad",
            Function::Rate => "rate",
            Function::Resets => "resets",
            Function::Round => "round",
            Function::Scalar => "scalar",
            Function::Sgn => "sgn",
            Function::Sin => "sin",
            Function::Sinh => "sinh",
            Function::Sort => "sort",
            Function::SortDesc => "sort_desc",
            Function::Sqrt => "sqrt",
            Function::StddevOverTime => "stddev_over_time",
            Function::StdvarOverTime => "stdvar_over_time",
            Function::SumOverTime => "sum_over_time",
            Function::Tan => "tan",
            Function::Tanh => "tanh",
            Function::Time => "time",
            Function::Timestamp => "timestamp",
            Function::Vector => "vector",
            Function::Year => "year",
        }
    }

    /// Look up a function by the identifier used in query text.
    pub fn from_name(name: &str) -> Option<Function> {
        Function::ALL.iter().copied().find(|f| f.name() == name)
    }
}

const VECTOR: &[ValueType] = &[ValueType::Vector];
const MATRIX: &[ValueType] = &[ValueType::Matrix];

/// The signature of a built-in function.
///
/// Exhaustive over [`Function`]; a variant without an arm here is a compile
/// error, so the registry cannot drift out of sync with the grammar's
/// function set.
pub fn lookup_function(func: Function) -> FunctionSignature {
    use Function::*;

    const S: ValueType = ValueType::Scalar;
    const V: ValueType = ValueType::Vector;
    const M: ValueType = ValueType::Matrix;
    const STR: ValueType = ValueType::String;

    let (arg_types, variadic, return_type): (&'static [ValueType], i32, ValueType) = match func {
        // instant-vector transforms
        Abs | Absent | Acos | Acosh | Asin | Asinh | Atan | Atanh | Ceil | Cos | Cosh | Deg
        | Exp | Floor | HistogramCount | HistogramSum | Ln | Log10 | Log2 | Rad | Sgn | Sin
        | Sinh | Sort | SortDesc | Sqrt | Tan | Tanh | Timestamp => (VECTOR, 0, V),

        // range-vector reductions
        AbsentOverTime | AvgOverTime | Changes | CountOverTime | Delta | Deriv | Idelta
        | Increase | Irate | LastOverTime | MaxOverTime | MinOverTime | PresentOverTime | Rate
        | Resets | StddevOverTime | StdvarOverTime | SumOverTime => (MATRIX, 0, V),

        // time-component functions default to the evaluation timestamp when
        // the vector argument is omitted
        DaysInMonth | DayOfMonth | DayOfWeek | DayOfYear | Hour | Minute | Month | Year => {
            (VECTOR, 1, V)
        }

        Clamp => (&[V, S, S], 0, V),
        ClampMax | ClampMin => (&[V, S], 0, V),
        HistogramFraction => (&[S, S, V], 0, V),
        HistogramQuantile => (&[S, V], 0, V),
        HoltWinters => (&[M, S, S], 0, V),
        LabelJoin => (&[V, STR, STR, STR], -1, V),
        LabelReplace => (&[V, STR, STR, STR, STR], 0, V),
        Pi => (&[], 0, S),
        PredictLinear => (&[M, S], 0, V),
        QuantileOverTime => (&[S, M], 0, V),
        Round => (&[V, S], 1, V),
        Scalar => (VECTOR, 0, S),
        Time => (&[], 0, S),
        Vector => (&[S], 0, V),
    };

    FunctionSignature {
        name: func.name(),
        arg_types,
        variadic,
        return_type,
    }
}

/// An aggregation operator (`sum`, `topk`, ...). Aggregations are not
/// registry functions: they have their own grammar production and their own
/// arity rules, checked by the lint pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateOp {
    Sum,
    Min,
    Max,
    Avg,
    Group,
    Stddev,
    Stdvar,
    Count,
    CountValues,
    Bottomk,
    Topk,
    Quantile,
}

impl AggregateOp {
    pub fn name(&self) -> &'static str {
        match self {
            AggregateOp::Sum => "sum",
            AggregateOp::Min => "min",
            AggregateOp::Max => "max",
            AggregateOp::Avg => "avg",
            AggregateOp::Group => "group",
            AggregateOp::Stddev => "stddev",
            AggregateOp::Stdvar => "stdvar",
            AggregateOp::Count => "count",
            AggregateOp::CountValues => "count_values",
            AggregateOp::Bottomk => "bottomk",
            AggregateOp::Topk => "topk",
            AggregateOp::Quantile => "quantile",
        }
    }

    pub fn from_name(name: &str) -> Option<AggregateOp> {
        use AggregateOp::*;
        let op = match name {
            "sum" => Sum,
            "min" => Min,
            "max" => Max,
            "avg" => Avg,
            "group" => Group,
            "stddev" => Stddev,
            "stdvar" => Stdvar,
            "count" => Count,
            "count_values" => CountValues,
            "bottomk" => Bottomk,
            "topk" => Topk,
            "quantile" => Quantile,
            _ => return None,
        };
        Some(op)
    }

    /// True for aggregations taking a parameter before the vector argument.
    pub fn takes_param(&self) -> bool {
        matches!(
            self,
            AggregateOp::CountValues | AggregateOp::Bottomk | AggregateOp::Topk | AggregateOp::Quantile
        )
    }
}
