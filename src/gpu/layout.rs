use crate::shader::{DeclaredType, ParameterDescriptor};

/// Member types allowed in the host's parameter uniform block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockType {
    Float,
    Int,
    UInt,
    Vec2,
    Vec3,
    Vec4,
}

impl BlockType {
    pub fn from_declared(declared: DeclaredType) -> Option<Self> {
        match declared {
            DeclaredType::Float => Some(BlockType::Float),
            DeclaredType::Float2 => Some(BlockType::Vec2),
            DeclaredType::Float3 => Some(BlockType::Vec3),
            DeclaredType::Float4 => Some(BlockType::Vec4),
            DeclaredType::Int => Some(BlockType::Int),
            DeclaredType::UInt => Some(BlockType::UInt),
            // Not host-shareable in a uniform buffer
            DeclaredType::Bool => None,
        }
    }

    pub fn glsl_name(self) -> &'static str {
        match self {
            BlockType::Float => "float",
            BlockType::Int => "int",
            BlockType::UInt => "uint",
            BlockType::Vec2 => "vec2",
            BlockType::Vec3 => "vec3",
            BlockType::Vec4 => "vec4",
        }
    }

    // std140 base alignment
    fn align(self) -> usize {
        match self {
            BlockType::Float | BlockType::Int | BlockType::UInt => 4,
            BlockType::Vec2 => 8,
            BlockType::Vec3 | BlockType::Vec4 => 16,
        }
    }

    fn size(self) -> usize {
        match self {
            BlockType::Float | BlockType::Int | BlockType::UInt => 4,
            BlockType::Vec2 => 8,
            BlockType::Vec3 => 12,
            BlockType::Vec4 => 16,
        }
    }

    fn components(self) -> usize {
        self.size() / 4
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParamSlot {
    pub name: String,
    pub ty: BlockType,
    pub offset: usize,
}

/// std140 layout of the `Params` block, in declaration order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamLayout {
    slots: Vec<ParamSlot>,
    end: usize,
}

const PLACEHOLDER_MEMBER: &str = "shaderlab_unused";

impl ParamLayout {
    /// Append a member; returns false if the name is already laid out
    pub fn push(&mut self, name: &str, ty: BlockType) -> bool {
        if self.contains(name) {
            return false;
        }
        let offset = self.end.next_multiple_of(ty.align());
        self.end = offset + ty.size();
        self.slots.push(ParamSlot {
            name: name.to_string(),
            ty,
            offset,
        });
        true
    }

    pub fn contains(&self, name: &str) -> bool {
        self.slots.iter().any(|s| s.name == name)
    }

    pub fn slots(&self) -> &[ParamSlot] {
        &self.slots
    }

    /// Buffer size in bytes; blocks round up to 16 and are never empty
    pub fn size(&self) -> usize {
        self.end.max(4).next_multiple_of(16)
    }

    pub fn glsl_block(&self, set: u32, binding: u32) -> String {
        let mut block = format!("layout(set = {set}, binding = {binding}) uniform Params {{\n");
        if self.slots.is_empty() {
            block.push_str(&format!("    float {PLACEHOLDER_MEMBER};\n"));
        }
        for slot in &self.slots {
            block.push_str(&format!("    {} {};\n", slot.ty.glsl_name(), slot.name));
        }
        block.push_str("};");
        block
    }

    // AIDEV-NOTE: Values are matched by name; slots with no descriptor stay zeroed
    pub fn pack(&self, params: &[ParameterDescriptor]) -> Vec<u8> {
        let mut bytes = vec![0u8; self.size()];

        for slot in &self.slots {
            let Some(param) = params.iter().find(|p| p.name == slot.name) else {
                continue;
            };
            let mut components = param.value.components();
            components.resize(slot.ty.components(), 0.0);

            let target = &mut bytes[slot.offset..slot.offset + slot.ty.size()];
            match slot.ty {
                BlockType::Float | BlockType::Vec2 | BlockType::Vec3 | BlockType::Vec4 => {
                    target.copy_from_slice(bytemuck::cast_slice(&components));
                }
                BlockType::Int => {
                    let value = components[0].round() as i32;
                    target.copy_from_slice(bytemuck::bytes_of(&value));
                }
                BlockType::UInt => {
                    let value = components[0].max(0.0).round() as u32;
                    target.copy_from_slice(bytemuck::bytes_of(&value));
                }
            }
        }

        bytes
    }
}
