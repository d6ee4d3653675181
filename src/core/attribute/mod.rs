use crate::prelude::{ByteReader, ByteWriter};


#[remain::sorted]
#[derive(Debug, thiserror::Error, Clone, PartialEq)]
pub enum Err {
	#[error("Invalid component count {0}: attributes carry 1 to 4 components")]
	InvalidComponentCount(usize),
	#[error("Invalid DataTypeId: {0}")]
	InvalidDataTypeId(u8),
	#[error("Data of length {len} cannot be split into {num_components}-component values")]
	LengthNotMultiple { len: usize, num_components: usize },
	#[error("Reader error: {0}")]
	ReaderError(#[from] crate::core::bit_coder::ReaderErr),
}

/// The storage format of an attribute component.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ComponentDataType {
	U32,
	I32,
	U16,
	I16,
	U8,
	I8,
	F32,
	F64,
}

impl ComponentDataType {
	/// returns the size of the data type in bytes e.g. 4 for F32
	#[inline]
	pub fn size(self) -> usize {
		match self {
			ComponentDataType::U8 | ComponentDataType::I8 => 1,
			ComponentDataType::U16 | ComponentDataType::I16 => 2,
			ComponentDataType::U32 | ComponentDataType::I32 | ComponentDataType::F32 => 4,
			ComponentDataType::F64 => 8,
		}
	}

	#[inline]
	pub fn is_float(self) -> bool {
		matches!(self, ComponentDataType::F32 | ComponentDataType::F64)
	}

	/// returns unique id for the data type.
	#[inline]
	pub fn get_id(self) -> u8 {
		match self {
			ComponentDataType::U32 => 0,
			ComponentDataType::I32 => 1,
			ComponentDataType::U16 => 2,
			ComponentDataType::I16 => 3,
			ComponentDataType::U8 => 4,
			ComponentDataType::I8 => 5,
			ComponentDataType::F32 => 6,
			ComponentDataType::F64 => 7,
		}
	}

	pub fn from_id(id: u8) -> Result<Self, Err> {
		Ok(match id {
			0 => ComponentDataType::U32,
			1 => ComponentDataType::I32,
			2 => ComponentDataType::U16,
			3 => ComponentDataType::I16,
			4 => ComponentDataType::U8,
			5 => ComponentDataType::I8,
			6 => ComponentDataType::F32,
			7 => ComponentDataType::F64,
			_ => return Err(Err::InvalidDataTypeId(id)),
		})
	}

	#[inline]
	pub fn write_to<W: ByteWriter>(self, writer: &mut W) {
		writer.write_u8(self.get_id());
	}

	pub fn read_from<R: ByteReader>(reader: &mut R) -> Result<Self, Err> {
		Self::from_id(reader.read_u8()?)
	}
}


/// Operations every storage format supports. Implemented once per concrete numeric type,
/// so that an attribute picks its implementation when it is registered.
pub trait Scalar: Copy + Default + PartialOrd + std::fmt::Debug + 'static {
	const DATA_TYPE: ComponentDataType;

	fn to_f64(self) -> f64;

	/// converts with saturation at the bounds of the type. Integer targets are rounded.
	fn from_f64(value: f64) -> Self;

	fn wrap(data: Vec<Self>) -> AttributeData;

	fn peel(data: &AttributeData) -> Option<&[Self]>;
}

macro_rules! impl_scalar {
	($($ty:ty => $variant:ident, $is_float:literal);* $(;)?) => {
		$(
			impl Scalar for $ty {
				const DATA_TYPE: ComponentDataType = ComponentDataType::$variant;

				#[inline]
				fn to_f64(self) -> f64 {
					self as f64
				}

				#[inline]
				fn from_f64(value: f64) -> Self {
					if $is_float {
						value as $ty
					} else {
						value.round() as $ty
					}
				}

				fn wrap(data: Vec<Self>) -> AttributeData {
					AttributeData::$variant(data)
				}

				fn peel(data: &AttributeData) -> Option<&[Self]> {
					match data {
						AttributeData::$variant(v) => Some(v),
						_ => None,
					}
				}
			}
		)*
	};
}

impl_scalar! {
	u32 => U32, false;
	i32 => I32, false;
	u16 => U16, false;
	i16 => I16, false;
	u8 => U8, false;
	i8 => I8, false;
	f32 => F32, true;
	f64 => F64, true;
}


/// Flat component storage of an attribute, tagged by its storage format.
#[derive(Clone, Debug, PartialEq)]
pub enum AttributeData {
	U32(Vec<u32>),
	I32(Vec<i32>),
	U16(Vec<u16>),
	I16(Vec<i16>),
	U8(Vec<u8>),
	I8(Vec<i8>),
	F32(Vec<f32>),
	F64(Vec<f64>),
}

macro_rules! dispatch_data {
	($data:expr, $v:ident => $body:expr) => {
		match $data {
			AttributeData::U32($v) => $body,
			AttributeData::I32($v) => $body,
			AttributeData::U16($v) => $body,
			AttributeData::I16($v) => $body,
			AttributeData::U8($v) => $body,
			AttributeData::I8($v) => $body,
			AttributeData::F32($v) => $body,
			AttributeData::F64($v) => $body,
		}
	};
}

impl AttributeData {
	pub fn data_type(&self) -> ComponentDataType {
		match self {
			AttributeData::U32(_) => ComponentDataType::U32,
			AttributeData::I32(_) => ComponentDataType::I32,
			AttributeData::U16(_) => ComponentDataType::U16,
			AttributeData::I16(_) => ComponentDataType::I16,
			AttributeData::U8(_) => ComponentDataType::U8,
			AttributeData::I8(_) => ComponentDataType::I8,
			AttributeData::F32(_) => ComponentDataType::F32,
			AttributeData::F64(_) => ComponentDataType::F64,
		}
	}

	/// number of scalar components stored.
	pub fn len(&self) -> usize {
		dispatch_data!(self, v => v.len())
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// widens every component to f64.
	pub fn to_f64_vec(&self) -> Vec<f64> {
		dispatch_data!(self, v => v.iter().map(|x| x.to_f64()).collect())
	}

	/// builds storage of type 'ty' from f64 components, saturating at the bounds of the type.
	pub fn from_f64_slice(ty: ComponentDataType, values: &[f64]) -> Self {
		fn convert<T: Scalar>(values: &[f64]) -> AttributeData {
			T::wrap(values.iter().map(|&x| T::from_f64(x)).collect())
		}
		match ty {
			ComponentDataType::U32 => convert::<u32>(values),
			ComponentDataType::I32 => convert::<i32>(values),
			ComponentDataType::U16 => convert::<u16>(values),
			ComponentDataType::I16 => convert::<i16>(values),
			ComponentDataType::U8 => convert::<u8>(values),
			ComponentDataType::I8 => convert::<i8>(values),
			ComponentDataType::F32 => convert::<f32>(values),
			ComponentDataType::F64 => convert::<f64>(values),
		}
	}

	pub fn as_slice<T: Scalar>(&self) -> Option<&[T]> {
		T::peel(self)
	}
}

impl<T: Scalar> From<Vec<T>> for AttributeData {
	fn from(data: Vec<T>) -> Self {
		T::wrap(data)
	}
}


#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AttributeType {
	Position,
	Normal,
	Color,
	TextureCoordinate,
	Custom,
}

impl AttributeType {
	/// the name under which attributes of this type are registered by default.
	pub fn default_name(self) -> Option<&'static str> {
		match self {
			AttributeType::Position => Some("position"),
			AttributeType::Normal => Some("normal"),
			AttributeType::Color => Some("color"),
			AttributeType::TextureCoordinate => Some("uv"),
			AttributeType::Custom => None,
		}
	}

	pub fn from_name(name: &str) -> Self {
		match name {
			"position" => AttributeType::Position,
			"normal" => AttributeType::Normal,
			"color" => AttributeType::Color,
			"uv" => AttributeType::TextureCoordinate,
			_ => AttributeType::Custom,
		}
	}
}


/// A named per-vertex attribute. The components of vertex `i` are stored at
/// `i * num_components .. (i + 1) * num_components` of the data.
#[derive(Clone, Debug, PartialEq)]
pub struct Attribute {
	name: String,
	att_type: AttributeType,
	data: AttributeData,
	num_components: usize,
}

impl Attribute {
	pub fn new<T: Scalar>(name: impl Into<String>, att_type: AttributeType, data: Vec<T>, num_components: usize) -> Result<Self, Err> {
		Self::from_data(name, att_type, T::wrap(data), num_components)
	}

	pub fn from_data(name: impl Into<String>, att_type: AttributeType, data: AttributeData, num_components: usize) -> Result<Self, Err> {
		if !(1..=4).contains(&num_components) {
			return Err(Err::InvalidComponentCount(num_components));
		}
		if data.len() % num_components != 0 {
			return Err(Err::LengthNotMultiple { len: data.len(), num_components });
		}
		Ok(Self {
			name: name.into(),
			att_type,
			data,
			num_components,
		})
	}

	pub fn get_name(&self) -> &str {
		&self.name
	}

	pub fn get_attribute_type(&self) -> AttributeType {
		self.att_type
	}

	pub fn get_data(&self) -> &AttributeData {
		&self.data
	}

	pub fn get_component_type(&self) -> ComponentDataType {
		self.data.data_type()
	}

	pub fn get_num_components(&self) -> usize {
		self.num_components
	}

	/// number of vertices the attribute covers.
	pub fn len(&self) -> usize {
		self.data.len() / self.num_components
	}

	pub fn is_empty(&self) -> bool {
		self.data.is_empty()
	}

	pub fn as_slice<T: Scalar>(&self) -> Option<&[T]> {
		self.data.as_slice()
	}
}
